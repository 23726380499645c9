//! QR Code reading on top of `rqrr`.

use super::{EngineError, SymbolReader};
use crate::config::HintSet;
use crate::models::{BitMatrix, DecodeResult, Point, Symbology};

const SYMBOLOGIES: [Symbology; 1] = [Symbology::QrCode];

/// Locates and reads QR Codes in a binarized image
#[derive(Debug, Default)]
pub struct QrReader;

impl QrReader {
    /// New QR reader
    pub fn new() -> Self {
        Self
    }
}

/// Centres of the three finder patterns, bottom-left, top-left, top-right.
///
/// `bounds` are the symbol corners clockwise from top-left. Each centre sits
/// 3.5 modules in from its corner along both edges of a symbol that is
/// `17 + 4 * version` modules wide.
fn finder_centres(bounds: &[rqrr::Point; 4], version: usize) -> Vec<Point> {
    let corner = |i: usize| Point::from((bounds[i].x, bounds[i].y));
    let (tl, tr, br, bl) = (corner(0), corner(1), corner(2), corner(3));
    let modules = (17 + 4 * version) as f32;
    let near = 3.5 / modules;
    let far = 1.0 - near;

    // Bilinear position inside the quadrilateral
    let at = |u: f32, v: f32| {
        let top = (tl.x + (tr.x - tl.x) * u, tl.y + (tr.y - tl.y) * u);
        let bottom = (bl.x + (br.x - bl.x) * u, bl.y + (br.y - bl.y) * u);
        Point::new(top.0 + (bottom.0 - top.0) * v, top.1 + (bottom.1 - top.1) * v)
    };
    vec![at(near, far), at(near, near), at(far, near)]
}

impl SymbolReader for QrReader {
    fn symbologies(&self) -> &[Symbology] {
        &SYMBOLOGIES
    }

    fn decode(
        &mut self,
        bits: &BitMatrix,
        _hints: &HintSet,
    ) -> Result<Option<DecodeResult>, EngineError> {
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            bits.width(),
            bits.height(),
            |x, y| if bits.get(x, y) { 0 } else { 255 },
        );

        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Ok(None);
        }

        let mut failure = None;
        for grid in &grids {
            match grid.decode() {
                Ok((meta, text)) => {
                    let points = finder_centres(&grid.bounds, meta.version.0);
                    return Ok(Some(DecodeResult::new(text, Symbology::QrCode, points)));
                }
                Err(err) => failure = Some(err.to_string()),
            }
        }

        Err(EngineError::Corrupt {
            symbology: Symbology::QrCode,
            reason: failure.unwrap_or_default(),
        })
    }
}
