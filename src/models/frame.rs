use crate::error::ScanError;
use crate::models::Region;
use crate::utils::geometry::{crop, rotate_180, rotate_ccw, rotate_cw};
use crate::utils::grayscale::{rgb_to_grayscale, rgba_to_grayscale};
use std::fmt;

/// Clockwise rotation needed to bring a sensor frame upright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// Already upright
    #[default]
    Deg0,
    /// Rotate 90° clockwise (portrait capture on a landscape sensor)
    Deg90,
    /// Rotate 180°
    Deg180,
    /// Rotate 270° clockwise
    Deg270,
}

impl Rotation {
    /// Parse a rotation in degrees; only right angles are accepted
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    /// Angle in degrees
    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// True if applying this rotation swaps width and height
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// One camera frame: a luminance plane plus sensor orientation.
///
/// Frames are consumed by a single analysis pass and dropped afterwards.
#[derive(Clone)]
pub struct Frame {
    luma: Vec<u8>,
    width: usize,
    height: usize,
    rotation: Rotation,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation", &self.rotation)
            .finish_non_exhaustive()
    }
}

impl Frame {
    /// Wrap a luminance plane (one byte per pixel, row-major)
    pub fn from_luma(
        mut luma: Vec<u8>,
        width: usize,
        height: usize,
        rotation: Rotation,
    ) -> Result<Self, ScanError> {
        let len = check_len(luma.len(), width, height, 1)?;
        luma.truncate(len);
        Ok(Self {
            luma,
            width,
            height,
            rotation,
        })
    }

    /// Build from packed RGB
    pub fn from_rgb(
        rgb: &[u8],
        width: usize,
        height: usize,
        rotation: Rotation,
    ) -> Result<Self, ScanError> {
        check_len(rgb.len(), width, height, 3)?;
        Self::from_luma(rgb_to_grayscale(rgb, width, height), width, height, rotation)
    }

    /// Build from packed RGBA
    pub fn from_rgba(
        rgba: &[u8],
        width: usize,
        height: usize,
        rotation: Rotation,
    ) -> Result<Self, ScanError> {
        check_len(rgba.len(), width, height, 4)?;
        Self::from_luma(rgba_to_grayscale(rgba, width, height), width, height, rotation)
    }

    /// Sensor width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Sensor height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Sensor orientation
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Luminance samples as captured
    pub fn luma(&self) -> &[u8] {
        &self.luma
    }

    /// Rotate the plane upright, consuming the frame
    pub fn upright(self) -> Frame {
        let (w, h) = (self.width, self.height);
        let (luma, width, height) = match self.rotation {
            Rotation::Deg0 => return self,
            Rotation::Deg90 => (rotate_cw(&self.luma, w, h), h, w),
            Rotation::Deg180 => (rotate_180(&self.luma), w, h),
            Rotation::Deg270 => (rotate_ccw(&self.luma, w, h), h, w),
        };
        Frame {
            luma,
            width,
            height,
            rotation: Rotation::Deg0,
        }
    }

    /// Copy out `region`; `None` if it is not inside the frame
    pub fn crop(&self, region: &Region) -> Option<Vec<u8>> {
        crop(&self.luma, self.width, self.height, region)
    }
}

/// Bytes needed for a `width` x `height` plane of `channels`, checked
/// against the `actual` buffer length. Unrepresentable sizes report
/// `usize::MAX` as expected.
fn check_len(actual: usize, width: usize, height: usize, channels: usize) -> Result<usize, ScanError> {
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .unwrap_or(usize::MAX);
    if actual < expected {
        return Err(ScanError::BufferSize { expected, actual });
    }
    Ok(expected)
}
