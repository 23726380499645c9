//! Ambient light monitoring for the flashlight affordance.
//!
//! Not part of decoding. A host feeds lux readings in and shows or hides its
//! flashlight control based on the resulting [`LightLevel`].

use std::time::{Duration, Instant};

/// Readings closer together than this are ignored
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);
/// At or below this the scene is dark
pub const DEFAULT_DARK_LUX: f32 = 45.0;
/// At or above this the scene is bright
pub const DEFAULT_BRIGHT_LUX: f32 = 100.0;

/// Classified ambient light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightLevel {
    /// Too dark to scan comfortably
    Dark,
    /// Bright enough without a torch
    Bright,
}

/// Throttled lux classifier
#[derive(Debug, Clone)]
pub struct LightMonitor {
    enabled: bool,
    dark_lux: f32,
    bright_lux: f32,
    interval: Duration,
    last_reading: Option<Instant>,
}

impl Default for LightMonitor {
    fn default() -> Self {
        Self {
            enabled: true,
            dark_lux: DEFAULT_DARK_LUX,
            bright_lux: DEFAULT_BRIGHT_LUX,
            interval: DEFAULT_INTERVAL,
            last_reading: None,
        }
    }
}

impl LightMonitor {
    /// Monitor with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dark threshold
    pub fn set_dark_lux(&mut self, lux: f32) {
        self.dark_lux = lux;
    }

    /// Set the bright threshold
    pub fn set_bright_lux(&mut self, lux: f32) {
        self.bright_lux = lux;
    }

    /// Dark threshold
    pub fn dark_lux(&self) -> f32 {
        self.dark_lux
    }

    /// Bright threshold
    pub fn bright_lux(&self) -> f32 {
        self.bright_lux
    }

    /// Enable or disable classification
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether readings are classified
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Classify a reading taken at `now`. Returns `None` for throttled
    /// readings and for values between the two thresholds.
    pub fn on_reading(&mut self, lux: f32, now: Instant) -> Option<LightLevel> {
        if !self.enabled {
            return None;
        }
        let throttled = self
            .last_reading
            .is_some_and(|last| now.saturating_duration_since(last) < self.interval);
        if throttled {
            return None;
        }
        self.last_reading = Some(now);

        if lux <= self.dark_lux {
            Some(LightLevel::Dark)
        } else if lux >= self.bright_lux {
            Some(LightLevel::Bright)
        } else {
            None
        }
    }
}

/// Whether the flashlight control should be shown after a light change.
///
/// Dark scenes always show it. Bright scenes hide it unless the torch is on,
/// in which case it keeps its current visibility so the user can switch the
/// torch off.
pub fn flashlight_visible(level: LightLevel, torch_on: bool, visible: bool) -> bool {
    match level {
        LightLevel::Dark => true,
        LightLevel::Bright => visible && torch_on,
    }
}
