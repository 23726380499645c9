//! Region-of-interest selection.

use crate::config::DecodeConfig;
use crate::models::Region;

/// Sub-rectangle of a `width` x `height` frame to analyse.
///
/// Full-area scan wins over everything, then an explicit rectangle (used
/// verbatim, not clamped), then a centred square of side
/// `floor(min(width, height) * area_ratio)` shifted by the configured offsets.
/// Degenerate or out-of-frame regions are returned as computed.
pub fn select_region(width: usize, height: usize, config: &DecodeConfig) -> Region {
    let (w, h) = (saturate(width as i64), saturate(height as i64));
    if config.full_area_scan {
        return Region::new(0, 0, w, h);
    }
    if let Some(area) = config.analyze_area {
        return area;
    }

    let size = (w.min(h) as f32 * config.area_ratio).floor() as i32;
    let left = (w as i64 - size as i64) / 2 + config.horizontal_offset as i64;
    let top = (h as i64 - size as i64) / 2 + config.vertical_offset as i64;
    Region::new(saturate(left), saturate(top), size, size)
}

fn saturate(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
