//! Binarization strategies turning luminance into a [`BitMatrix`].
//!
//! - [`hybrid_binarize`]: block-local thresholds averaged over a 5x5 block
//!   neighbourhood. Keeps sharp module edges under soft gradients.
//! - [`histogram_binarize`]: one global threshold chosen from the luminance
//!   histogram with Otsu's method.
//! - [`threshold_binarize`]: fixed global threshold.
//!
//! All return a matrix where `true` = black.

use crate::models::BitMatrix;

const BLOCK_SIZE_POWER: usize = 3;
const BLOCK_SIZE: usize = 1 << BLOCK_SIZE_POWER;
const BLOCK_SIZE_MASK: usize = BLOCK_SIZE - 1;
const MINIMUM_DIMENSION: usize = BLOCK_SIZE * 5;
const MIN_DYNAMIC_RANGE: u32 = 24;

/// Local block binarizer.
///
/// Images smaller than 40 pixels on either side have too few blocks for a
/// neighbourhood average and fall back to [`histogram_binarize`].
pub fn hybrid_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    if width < MINIMUM_DIMENSION || height < MINIMUM_DIMENSION {
        return histogram_binarize(gray, width, height);
    }

    let sub_width = (width >> BLOCK_SIZE_POWER) + usize::from(width & BLOCK_SIZE_MASK != 0);
    let sub_height = (height >> BLOCK_SIZE_POWER) + usize::from(height & BLOCK_SIZE_MASK != 0);
    let black_points = block_black_points(gray, sub_width, sub_height, width, height);

    let mut binary = BitMatrix::new(width, height);
    let max_y_offset = height - BLOCK_SIZE;
    let max_x_offset = width - BLOCK_SIZE;
    for y in 0..sub_height {
        let y_offset = (y << BLOCK_SIZE_POWER).min(max_y_offset);
        let top = cap(y, sub_height - 3);
        for x in 0..sub_width {
            let x_offset = (x << BLOCK_SIZE_POWER).min(max_x_offset);
            let left = cap(x, sub_width - 3);

            let mut sum = 0u32;
            for row in &black_points[top - 2..=top + 2] {
                sum += row[left - 2..=left + 2].iter().sum::<u32>();
            }
            let threshold = sum / 25;

            for yy in 0..BLOCK_SIZE {
                let offset = (y_offset + yy) * width + x_offset;
                for xx in 0..BLOCK_SIZE {
                    if gray[offset + xx] as u32 <= threshold {
                        binary.set(x_offset + xx, y_offset + yy, true);
                    }
                }
            }
        }
    }

    binary
}

#[inline]
fn cap(value: usize, max: usize) -> usize {
    if value < 2 { 2 } else { value.min(max) }
}

/// Estimated black point for every 8x8 block.
///
/// Low-contrast blocks are assumed to be background: they take half their
/// minimum, or the neighbouring blocks' estimate when that is brighter.
fn block_black_points(
    gray: &[u8],
    sub_width: usize,
    sub_height: usize,
    width: usize,
    height: usize,
) -> Vec<Vec<u32>> {
    let max_y_offset = height - BLOCK_SIZE;
    let max_x_offset = width - BLOCK_SIZE;
    let mut black_points = vec![vec![0u32; sub_width]; sub_height];

    for y in 0..sub_height {
        let y_offset = (y << BLOCK_SIZE_POWER).min(max_y_offset);
        for x in 0..sub_width {
            let x_offset = (x << BLOCK_SIZE_POWER).min(max_x_offset);
            let mut sum = 0u32;
            let mut min = u8::MAX;
            let mut max = u8::MIN;
            for yy in 0..BLOCK_SIZE {
                let offset = (y_offset + yy) * width + x_offset;
                for &pixel in &gray[offset..offset + BLOCK_SIZE] {
                    sum += pixel as u32;
                    min = min.min(pixel);
                    max = max.max(pixel);
                }
            }

            let mut average = sum >> (BLOCK_SIZE_POWER * 2);
            if (max - min) as u32 <= MIN_DYNAMIC_RANGE {
                average = min as u32 / 2;
                if y > 0 && x > 0 {
                    let neighbours = (black_points[y - 1][x]
                        + 2 * black_points[y][x - 1]
                        + black_points[y - 1][x - 1])
                        / 4;
                    if (min as u32) < neighbours {
                        average = neighbours;
                    }
                }
            }
            black_points[y][x] = average;
        }
    }

    black_points
}

/// Global histogram binarizer using Otsu's threshold
pub fn histogram_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    let threshold = otsu_threshold(&gray[..(width * height).min(gray.len())]);
    threshold_binarize(gray, width, height, threshold)
}

/// Otsu's optimal threshold: maximises between-class variance over the histogram
pub fn otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total = gray.len() as f64;
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut best_variance = 0.0;
    let mut best_threshold = 128u8;
    let mut dark_count = 0.0;
    let mut dark_sum = 0.0;

    // Pixels strictly below `threshold` form the dark class
    for threshold in 1..256usize {
        dark_count += histogram[threshold - 1] as f64;
        dark_sum += (threshold - 1) as f64 * histogram[threshold - 1] as f64;
        let light_count = total - dark_count;
        if dark_count == 0.0 || light_count == 0.0 {
            continue;
        }

        let dark_mean = dark_sum / dark_count;
        let light_mean = (total_sum - dark_sum) / light_count;
        let variance = (dark_count / total) * (light_count / total) * (dark_mean - light_mean).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_threshold = threshold as u8;
        }
    }

    best_threshold
}

/// Simple global threshold binarization: pixels below `threshold` are black
pub fn threshold_binarize(gray: &[u8], width: usize, height: usize, threshold: u8) -> BitMatrix {
    let mut binary = BitMatrix::new(width, height);
    for (y, row) in gray.chunks(width.max(1)).take(height).enumerate() {
        for (x, &pixel) in row.iter().enumerate() {
            if pixel < threshold {
                binary.set(x, y, true);
            }
        }
    }
    binary
}
