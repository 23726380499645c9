//! Decode and session configuration.
//!
//! `DecodeConfig` and `SessionConfig` are plain values fixed at session setup.
//! Both load from TOML; omitted keys take their defaults. A few process-wide
//! defaults can be tuned through environment variables.

use crate::error::ScanError;
use crate::models::{Region, Symbology};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

/// Default fraction of `min(width, height)` covered by the scan square
pub const DEFAULT_AREA_RATIO: f32 = 0.6;

fn parse_env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

static ZOOM_COOLDOWN_MS: OnceLock<u64> = OnceLock::new();

/// Minimum gap between two auto-zoom actions (`SCAN_ZOOM_COOLDOWN_MS`, default 100)
pub fn zoom_cooldown_ms() -> u64 {
    *ZOOM_COOLDOWN_MS.get_or_init(|| parse_env_u64("SCAN_ZOOM_COOLDOWN_MS", 100))
}

static STILL_MAX_WIDTH: OnceLock<u32> = OnceLock::new();

/// Width bound for still-image downsampling (`SCAN_STILL_MAX_WIDTH`, default 480)
pub fn still_max_width() -> u32 {
    *STILL_MAX_WIDTH.get_or_init(|| parse_env_u32("SCAN_STILL_MAX_WIDTH", 480).max(1))
}

static STILL_MAX_HEIGHT: OnceLock<u32> = OnceLock::new();

/// Height bound for still-image downsampling (`SCAN_STILL_MAX_HEIGHT`, default 640)
pub fn still_max_height() -> u32 {
    *STILL_MAX_HEIGHT.get_or_init(|| parse_env_u32("SCAN_STILL_MAX_HEIGHT", 640).max(1))
}

/// Which symbologies to attempt, plus effort level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintSet {
    /// Symbologies to attempt; empty means all
    pub formats: BTreeSet<Symbology>,
    /// Spend more time per source (more rows scanned for linear codes)
    pub try_harder: bool,
}

impl HintSet {
    /// Hints for a fixed list of symbologies
    pub fn of(formats: impl IntoIterator<Item = Symbology>) -> Self {
        Self {
            formats: formats.into_iter().collect(),
            try_harder: true,
        }
    }

    /// Every supported symbology
    pub fn all() -> Self {
        Self::of(Symbology::ALL)
    }

    /// QR Code only
    pub fn qr_code() -> Self {
        Self::of([Symbology::QrCode])
    }

    /// Linear (1-D) symbologies only
    pub fn one_dimensional() -> Self {
        Self::of([Symbology::Ean13, Symbology::Ean8, Symbology::UpcA])
    }

    /// 2-D symbologies only
    pub fn two_dimensional() -> Self {
        Self::of([Symbology::QrCode])
    }

    /// Parse a preset name: `all`, `qr`, `1d`, `2d` or `default`
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::all()),
            "qr" | "qr_code" => Some(Self::qr_code()),
            "1d" | "one_dimensional" => Some(Self::one_dimensional()),
            "2d" | "two_dimensional" => Some(Self::two_dimensional()),
            "default" => Some(Self::default()),
            _ => None,
        }
    }

    /// True if `symbology` should be attempted
    pub fn allows(&self, symbology: Symbology) -> bool {
        self.formats.is_empty() || self.formats.contains(&symbology)
    }
}

impl Default for HintSet {
    /// QR Code plus the common retail linear codes
    fn default() -> Self {
        Self::of([Symbology::QrCode, Symbology::Ean13, Symbology::UpcA])
    }
}

/// Immutable decode settings supplied once at session setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Symbologies to attempt
    pub hints: HintSet,
    /// Analyse the whole frame, ignoring every other region setting
    pub full_area_scan: bool,
    /// Explicit analysis rectangle, used verbatim
    pub analyze_area: Option<Region>,
    /// Scan square side as a fraction of `min(width, height)`
    pub area_ratio: f32,
    /// Horizontal shift of the scan square, in pixels
    pub horizontal_offset: i32,
    /// Vertical shift of the scan square, in pixels
    pub vertical_offset: i32,
    /// Reserved for frames yielding several results
    pub multi_decode: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            hints: HintSet::default(),
            full_area_scan: false,
            analyze_area: None,
            area_ratio: DEFAULT_AREA_RATIO,
            horizontal_offset: 0,
            vertical_offset: 0,
            multi_decode: true,
        }
    }
}

impl DecodeConfig {
    /// Replace the hint set
    pub fn with_hints(mut self, hints: HintSet) -> Self {
        self.hints = hints;
        self
    }

    /// Enable or disable full-area scanning
    pub fn with_full_area_scan(mut self, full_area_scan: bool) -> Self {
        self.full_area_scan = full_area_scan;
        self
    }

    /// Use an explicit analysis rectangle
    pub fn with_analyze_area(mut self, area: Region) -> Self {
        self.analyze_area = Some(area);
        self
    }

    /// Set the scan square ratio
    pub fn with_area_ratio(mut self, ratio: f32) -> Self {
        self.area_ratio = ratio;
        self
    }

    /// Shift the scan square
    pub fn with_offsets(mut self, horizontal: i32, vertical: i32) -> Self {
        self.horizontal_offset = horizontal;
        self.vertical_offset = vertical;
        self
    }
}

/// Settings for one live scanning session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Region and hint settings
    pub decode: DecodeConfig,
    /// Zoom in automatically when a QR code reads but looks small
    pub auto_zoom: bool,
    /// Minimum gap between auto-zoom actions
    pub zoom_cooldown_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            decode: DecodeConfig::default(),
            auto_zoom: true,
            zoom_cooldown_ms: zoom_cooldown_ms(),
        }
    }
}

impl SessionConfig {
    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ScanError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
