//! Luminance sources: read-only views over pixel brightness that can be
//! inverted and, when supported, rotated. Every transform yields a new source;
//! the source it came from is never modified.

mod chain;

pub use chain::{Candidate, Transform, TransformChain};

use crate::utils::geometry::rotate_ccw;
use std::borrow::Cow;
use std::sync::Arc;

/// A view over luminance samples, row-major, one byte per pixel
pub trait LuminanceSource: Clone {
    /// Width in pixels
    fn width(&self) -> usize;

    /// Height in pixels
    fn height(&self) -> usize;

    /// Samples of row `y`
    fn row(&self, y: usize) -> Cow<'_, [u8]>;

    /// All samples, row-major
    fn matrix(&self) -> Cow<'_, [u8]> {
        let mut out = Vec::with_capacity(self.width() * self.height());
        for y in 0..self.height() {
            out.extend_from_slice(&self.row(y));
        }
        Cow::Owned(out)
    }

    /// A new source whose samples are the logical NOT of this one's
    fn invert(&self) -> Self;

    /// Whether [`rotate_counter_clockwise`](Self::rotate_counter_clockwise) is available
    fn is_rotate_supported(&self) -> bool {
        false
    }

    /// A new source rotated 90° counter-clockwise, if supported
    fn rotate_counter_clockwise(&self) -> Option<Self> {
        None
    }
}

/// Owned grayscale luminance. Cloning shares the pixel buffer.
#[derive(Debug, Clone)]
pub struct GrayLuminance {
    data: Arc<[u8]>,
    width: usize,
    height: usize,
    inverted: bool,
}

impl GrayLuminance {
    /// Wrap a row-major grayscale buffer. Returns `None` when the buffer is
    /// shorter than `width * height` or either dimension is zero.
    pub fn new(data: impl Into<Arc<[u8]>>, width: usize, height: usize) -> Option<Self> {
        let data = data.into();
        if width == 0 || height == 0 || data.len() < width * height {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            inverted: false,
        })
    }

    /// True if this source reads its buffer inverted
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }
}

impl LuminanceSource for GrayLuminance {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn row(&self, y: usize) -> Cow<'_, [u8]> {
        let row = &self.data[y * self.width..(y + 1) * self.width];
        if self.inverted {
            Cow::Owned(row.iter().map(|v| !v).collect())
        } else {
            Cow::Borrowed(row)
        }
    }

    fn matrix(&self) -> Cow<'_, [u8]> {
        let plane = &self.data[..self.width * self.height];
        if self.inverted {
            Cow::Owned(plane.iter().map(|v| !v).collect())
        } else {
            Cow::Borrowed(plane)
        }
    }

    fn invert(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            width: self.width,
            height: self.height,
            inverted: !self.inverted,
        }
    }

    fn is_rotate_supported(&self) -> bool {
        true
    }

    fn rotate_counter_clockwise(&self) -> Option<Self> {
        let rotated = rotate_ccw(&self.data[..self.width * self.height], self.width, self.height);
        Some(Self {
            data: rotated.into(),
            width: self.height,
            height: self.width,
            inverted: self.inverted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GrayLuminance {
        // 1 2 3
        // 4 5 6
        GrayLuminance::new(vec![1u8, 2, 3, 4, 5, 6], 3, 2).unwrap()
    }

    #[test]
    fn test_rejects_short_or_empty_buffers() {
        assert!(GrayLuminance::new(vec![0u8; 5], 3, 2).is_none());
        assert!(GrayLuminance::new(Vec::<u8>::new(), 0, 0).is_none());
    }

    #[test]
    fn test_invert_is_independent() {
        let source = sample();
        let inverted = source.invert();
        assert_eq!(&*inverted.row(0), &[254, 253, 252]);
        assert_eq!(&*source.row(0), &[1, 2, 3]);
        assert!(!source.is_inverted());
        assert_eq!(&*inverted.invert().matrix(), &*source.matrix());
    }

    #[test]
    fn test_rotate_counter_clockwise() {
        let source = sample();
        assert!(source.is_rotate_supported());
        let rotated = source.rotate_counter_clockwise().unwrap();
        assert_eq!((rotated.width(), rotated.height()), (2, 3));
        assert_eq!(&*rotated.matrix(), &[3, 6, 2, 5, 1, 4]);
        assert_eq!((source.width(), source.height()), (3, 2));
    }
}
