use serde::{Deserialize, Serialize};

/// Rectangle in frame pixel coordinates.
///
/// Coordinates are signed because configured offsets may push the region past
/// the top-left edge; such a region simply fails to crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Region {
    /// Left edge
    pub left: i32,
    /// Top edge
    pub top: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Region {
    /// Create a new region
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> i64 {
        self.left as i64 + self.width as i64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i64 {
        self.top as i64 + self.height as i64
    }

    /// True when the region has no pixels
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True when the region is non-empty and lies inside a `width` x `height` frame
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        !self.is_empty()
            && self.left >= 0
            && self.top >= 0
            && self.right() <= width as i64
            && self.bottom() <= height as i64
    }
}
