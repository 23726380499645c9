//! Pixel-buffer helpers shared by the frame and still-image paths:
//! - Grayscale conversion (RGB/RGBA to luminance)
//! - Binarization strategies
//! - Geometry (rotation, cropping, integer sub-sampling)

pub mod binarization;
pub mod geometry;
pub mod grayscale;
