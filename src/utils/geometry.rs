//! Buffer geometry for single-channel (luma) images: rotation, cropping and
//! integer sub-sampling.

use crate::models::Region;

/// Rotate a luma plane 90° clockwise. The result is `height` wide and `width` tall.
pub fn rotate_cw(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; data.len()];
    for y in 0..height {
        let row = &data[y * width..(y + 1) * width];
        for (x, &v) in row.iter().enumerate() {
            out[x * height + (height - 1 - y)] = v;
        }
    }
    out
}

/// Rotate a luma plane 90° counter-clockwise. The result is `height` wide and `width` tall.
pub fn rotate_ccw(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; data.len()];
    for y in 0..height {
        let row = &data[y * width..(y + 1) * width];
        for (x, &v) in row.iter().enumerate() {
            out[(width - 1 - x) * height + y] = v;
        }
    }
    out
}

/// Rotate a luma plane by 180°
pub fn rotate_180(data: &[u8]) -> Vec<u8> {
    data.iter().rev().copied().collect()
}

/// Copy `region` out of a `width` x `height` luma plane.
///
/// Returns `None` when the region does not fit inside the plane.
pub fn crop(data: &[u8], width: usize, height: usize, region: &Region) -> Option<Vec<u8>> {
    if !region.fits_within(width, height) || data.len() < width * height {
        return None;
    }
    let (left, top) = (region.left as usize, region.top as usize);
    let (w, h) = (region.width as usize, region.height as usize);
    if left == 0 && top == 0 && w == width && h == height {
        return Some(data[..width * height].to_vec());
    }

    let mut out = Vec::with_capacity(w * h);
    for y in top..top + h {
        let start = y * width + left;
        out.extend_from_slice(&data[start..start + w]);
    }
    Some(out)
}

/// Integer sample size bounding an image to roughly `max_width` x `max_height`.
///
/// Each axis contributes `dim / max` (floor) when it exceeds its bound; the
/// larger factor wins so the aspect ratio is preserved.
pub fn sample_size(width: u32, height: u32, max_width: u32, max_height: u32) -> u32 {
    let w_size = if max_width > 0 && width > max_width {
        width / max_width
    } else {
        1
    };
    let h_size = if max_height > 0 && height > max_height {
        height / max_height
    } else {
        1
    };
    w_size.max(h_size).max(1)
}

/// Nearest-neighbour sub-sampling of an interleaved buffer with `channels`
/// bytes per pixel. Output dimensions are `floor(dim / sample)`, at least 1.
pub fn subsample(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    sample: usize,
) -> (Vec<u8>, usize, usize) {
    if sample <= 1 {
        return (data.to_vec(), width, height);
    }
    let out_w = (width / sample).max(1);
    let out_h = (height / sample).max(1);
    let mut out = Vec::with_capacity(out_w * out_h * channels);
    for y in 0..out_h {
        let src_row = y * sample * width;
        for x in 0..out_w {
            let idx = (src_row + x * sample) * channels;
            out.extend_from_slice(&data[idx..idx + channels]);
        }
    }
    (out, out_w, out_h)
}
