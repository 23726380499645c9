//! EAN-13, UPC-A and EAN-8 reading on top of `rxing`'s UPC/EAN readers.
//!
//! The binarized matrix is handed to rxing as a two-level luminance plane, so
//! its own global-histogram binarizer reproduces the bits exactly. Row
//! sampling, mirrored rows and the UPC-A/EAN-13 leading-zero rule all come
//! from rxing.

use super::{EngineError, SymbolReader};
use crate::config::HintSet;
use crate::models::{BitMatrix, DecodeResult, Point, Symbology};
use rxing::common::GlobalHistogramBinarizer;
use rxing::{
    BarcodeFormat, BinaryBitmap, DecodeHintType, DecodeHintValue, DecodingHintDictionary,
    Exceptions, Luma8LuminanceSource, Reader,
};
use std::collections::HashSet;

const SYMBOLOGIES: [Symbology; 3] = [Symbology::Ean13, Symbology::Ean8, Symbology::UpcA];

fn format_of(symbology: Symbology) -> Option<BarcodeFormat> {
    match symbology {
        Symbology::Ean13 => Some(BarcodeFormat::EAN_13),
        Symbology::Ean8 => Some(BarcodeFormat::EAN_8),
        Symbology::UpcA => Some(BarcodeFormat::UPC_A),
        _ => None,
    }
}

fn symbology_of(format: &BarcodeFormat) -> Option<Symbology> {
    match format {
        BarcodeFormat::EAN_13 => Some(Symbology::Ean13),
        BarcodeFormat::EAN_8 => Some(Symbology::Ean8),
        BarcodeFormat::UPC_A => Some(Symbology::UpcA),
        _ => None,
    }
}

/// rxing hints for the linear symbologies `hints` allows
fn decode_hints(hints: &HintSet) -> DecodingHintDictionary {
    let formats: HashSet<BarcodeFormat> = SYMBOLOGIES
        .iter()
        .filter(|&&s| hints.allows(s))
        .filter_map(|&s| format_of(s))
        .collect();

    let mut dictionary = DecodingHintDictionary::new();
    dictionary.insert(
        DecodeHintType::POSSIBLE_FORMATS,
        DecodeHintValue::PossibleFormats(formats),
    );
    if hints.try_harder {
        dictionary.insert(DecodeHintType::TRY_HARDER, DecodeHintValue::TryHarder(true));
    }
    dictionary
}

fn luminance_of(bits: &BitMatrix) -> Result<Luma8LuminanceSource, EngineError> {
    let (width, height) = (bits.width(), bits.height());
    let (Ok(w), Ok(h)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err(EngineError::InvalidInput(format!(
            "{width}x{height} matrix too large for the linear reader"
        )));
    };

    let mut luma = Vec::with_capacity(width * height);
    for y in 0..height {
        luma.extend((0..width).map(|x| if bits.get(x, y) { 0 } else { 255 }));
    }
    Ok(Luma8LuminanceSource::new(luma, w, h))
}

/// Reads EAN-13, UPC-A and EAN-8 symbols. Holds no state between
/// attempts; each one gets a fresh rxing reader.
#[derive(Debug, Default)]
pub struct EanReader;

impl EanReader {
    /// New reader
    pub fn new() -> Self {
        Self
    }
}

impl SymbolReader for EanReader {
    fn symbologies(&self) -> &[Symbology] {
        &SYMBOLOGIES
    }

    fn decode(
        &mut self,
        bits: &BitMatrix,
        hints: &HintSet,
    ) -> Result<Option<DecodeResult>, EngineError> {
        let Some(&hinted) = SYMBOLOGIES.iter().find(|&&s| hints.allows(s)) else {
            return Ok(None);
        };

        let mut image = BinaryBitmap::new(GlobalHistogramBinarizer::new(luminance_of(bits)?));
        let mut reader = rxing::MultiFormatReader::default();
        let found = match reader.decode_with_hints(&mut image, &decode_hints(hints)) {
            Ok(found) => found,
            Err(Exceptions::NotFoundException(_)) => return Ok(None),
            Err(err) => {
                return Err(EngineError::Corrupt {
                    symbology: hinted,
                    reason: err.to_string(),
                });
            }
        };

        let Some(symbology) = symbology_of(found.getBarcodeFormat()).filter(|&s| hints.allows(s))
        else {
            return Ok(None);
        };
        let points = found
            .getPoints()
            .iter()
            .map(|p| Point::new(p.x, p.y))
            .collect();
        Ok(Some(DecodeResult::new(found.getText(), symbology, points)))
    }
}
