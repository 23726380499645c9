//! Camera-control collaborator surface.
//!
//! The pipeline never drives a device directly; it only asks for zoom steps
//! through [`CameraControl`] and never reads back confirmation.

/// Zoom increment for both ratio and linear steps
pub const ZOOM_STEP: f32 = 0.1;

/// Current zoom as reported by the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    /// Current zoom ratio
    pub ratio: f32,
    /// Smallest supported ratio
    pub min_ratio: f32,
    /// Largest supported ratio
    pub max_ratio: f32,
    /// Current linear zoom in `[0, 1]`
    pub linear: f32,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            ratio: 1.0,
            min_ratio: 1.0,
            max_ratio: 1.0,
            linear: 0.0,
        }
    }
}

/// Zoom control exposed by the camera collaborator
pub trait CameraControl: Send {
    /// Current zoom, if the camera is bound
    fn zoom_state(&self) -> Option<ZoomState>;

    /// Request an absolute zoom ratio
    fn set_zoom_ratio(&mut self, ratio: f32);

    /// Request an absolute linear zoom in `[0, 1]`
    fn set_linear_zoom(&mut self, linear: f32);

    /// One ratio step in, unless that would pass the maximum
    fn zoom_in(&mut self) {
        if let Some(state) = self.zoom_state() {
            let ratio = state.ratio + ZOOM_STEP;
            if ratio <= state.max_ratio {
                self.set_zoom_ratio(ratio);
            }
        }
    }

    /// One ratio step out, unless that would pass the minimum
    fn zoom_out(&mut self) {
        if let Some(state) = self.zoom_state() {
            let ratio = state.ratio - ZOOM_STEP;
            if ratio >= state.min_ratio {
                self.set_zoom_ratio(ratio);
            }
        }
    }

    /// Absolute ratio, clamped to the supported range
    fn zoom_to(&mut self, ratio: f32) {
        if let Some(state) = self.zoom_state() {
            self.set_zoom_ratio(ratio.clamp(state.min_ratio, state.max_ratio));
        }
    }

    /// One linear step in
    fn line_zoom_in(&mut self) {
        if let Some(state) = self.zoom_state() {
            let linear = state.linear + ZOOM_STEP;
            if linear <= 1.0 {
                self.set_linear_zoom(linear);
            }
        }
    }

    /// One linear step out
    fn line_zoom_out(&mut self) {
        if let Some(state) = self.zoom_state() {
            let linear = state.linear - ZOOM_STEP;
            if linear >= 0.0 {
                self.set_linear_zoom(linear);
            }
        }
    }

    /// Absolute linear zoom, clamped to `[0, 1]`
    fn line_zoom_to(&mut self, linear: f32) {
        self.set_linear_zoom(linear.clamp(0.0, 1.0));
    }
}

impl<C: CameraControl + ?Sized> CameraControl for Box<C> {
    fn zoom_state(&self) -> Option<ZoomState> {
        (**self).zoom_state()
    }

    fn set_zoom_ratio(&mut self, ratio: f32) {
        (**self).set_zoom_ratio(ratio);
    }

    fn set_linear_zoom(&mut self, linear: f32) {
        (**self).set_linear_zoom(linear);
    }
}

/// Camera without zoom support; every request is ignored
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedCamera;

impl CameraControl for FixedCamera {
    fn zoom_state(&self) -> Option<ZoomState> {
        None
    }

    fn set_zoom_ratio(&mut self, _ratio: f32) {}

    fn set_linear_zoom(&mut self, _linear: f32) {}
}

/// In-memory camera that applies every request, for simulations and tests
#[derive(Debug, Clone, Default)]
pub struct SimulatedCamera {
    state: ZoomState,
    requests: usize,
}

impl SimulatedCamera {
    /// Camera supporting ratios in `[min_ratio, max_ratio]`, starting at `min_ratio`
    pub fn new(min_ratio: f32, max_ratio: f32) -> Self {
        Self {
            state: ZoomState {
                ratio: min_ratio,
                min_ratio,
                max_ratio,
                linear: 0.0,
            },
            requests: 0,
        }
    }

    /// Current zoom
    pub fn state(&self) -> ZoomState {
        self.state
    }

    /// Number of zoom changes applied
    pub fn requests(&self) -> usize {
        self.requests
    }
}

impl CameraControl for SimulatedCamera {
    fn zoom_state(&self) -> Option<ZoomState> {
        Some(self.state)
    }

    fn set_zoom_ratio(&mut self, ratio: f32) {
        self.state.ratio = ratio;
        self.requests += 1;
    }

    fn set_linear_zoom(&mut self, linear: f32) {
        self.state.linear = linear;
        self.requests += 1;
    }
}
