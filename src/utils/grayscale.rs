//! Colour to luminance conversion.
//!
//! Y = 0.299*R + 0.587*G + 0.114*B, computed with integer arithmetic as
//! Y = (76*R + 150*G + 29*B) >> 8. Large images are converted row-parallel
//! with rayon.

use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Pixel count above which conversion is split across rayon workers
const PARALLEL_THRESHOLD: usize = 640 * 480;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8;
    lum.min(255) as u8
}

fn convert_row(src: &[u8], channels: usize, row: &mut [u8]) {
    for (dst, px) in row.iter_mut().zip(src.chunks_exact(channels)) {
        *dst = luma(px[0], px[1], px[2]);
    }
}

fn convert(pixels: &[u8], width: usize, height: usize, channels: usize) -> Vec<u8> {
    let pixel_count = width * height;
    let mut gray = vec![0u8; pixel_count];
    if width == 0 || height == 0 {
        return gray;
    }
    let stride = width * channels;

    if pixel_count >= PARALLEL_THRESHOLD {
        gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            convert_row(&pixels[y * stride..(y + 1) * stride], channels, row);
        });
    } else {
        for (y, row) in gray.chunks_mut(width).enumerate() {
            convert_row(&pixels[y * stride..(y + 1) * stride], channels, row);
        }
    }
    gray
}

/// Convert an RGB image (3 bytes per pixel) to grayscale
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    convert(rgb, width, height, 3)
}

/// Convert an RGBA image (4 bytes per pixel) to grayscale, ignoring alpha
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    convert(rgba, width, height, 4)
}
