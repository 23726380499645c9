//! The decode engine seam.
//!
//! Everything symbology-specific lives behind [`DecodeEngine`]: given a
//! binarized source it either reads a symbol or reports a miss. The default
//! engine, [`MultiFormatReader`], dispatches to one [`SymbolReader`] per
//! symbology family.

pub mod ean;
pub mod qr;

use crate::config::HintSet;
use crate::models::{BitMatrix, DecodeResult, Symbology};

pub use ean::EanReader;
pub use qr::QrReader;

/// Faults raised inside the engine. Callers treat all of them as a miss.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The binarized input cannot be searched (e.g. zero-sized)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A symbol was located but its content could not be recovered
    #[error("{symbology} symbol found but unreadable: {reason}")]
    Corrupt {
        /// Symbology of the located symbol
        symbology: Symbology,
        /// Reader-specific detail
        reason: String,
    },

    /// The reader panicked
    #[error("decode engine panicked: {0}")]
    Panicked(String),
}

/// Reads one family of symbologies from a binarized image
pub trait SymbolReader: Send {
    /// Symbologies this reader can produce
    fn symbologies(&self) -> &[Symbology];

    /// Search `bits` for a symbol
    fn decode(
        &mut self,
        bits: &BitMatrix,
        hints: &HintSet,
    ) -> Result<Option<DecodeResult>, EngineError>;

    /// Drop any per-scan state
    fn reset(&mut self) {}
}

/// A stateful decoder configured with hints for the duration of one scan
pub trait DecodeEngine {
    /// Configure the symbologies and effort for the next attempts
    fn set_hints(&mut self, hints: &HintSet);

    /// One decode attempt on a binarized source
    fn decode(&mut self, bits: &BitMatrix) -> Result<Option<DecodeResult>, EngineError>;

    /// Return to the unconfigured state
    fn reset(&mut self);
}

/// Dispatches to every reader whose symbologies are hinted, first hit wins
pub struct MultiFormatReader {
    readers: Vec<Box<dyn SymbolReader>>,
    hints: HintSet,
}

impl MultiFormatReader {
    /// Reader for every supported symbology (QR first, then EAN/UPC)
    pub fn new() -> Self {
        Self::with_readers(vec![Box::new(QrReader::new()), Box::new(EanReader::new())])
    }

    /// Reader over a custom set of symbol readers
    pub fn with_readers(readers: Vec<Box<dyn SymbolReader>>) -> Self {
        Self {
            readers,
            hints: HintSet::all(),
        }
    }

    /// Hints currently in effect
    pub fn hints(&self) -> &HintSet {
        &self.hints
    }
}

impl Default for MultiFormatReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeEngine for MultiFormatReader {
    fn set_hints(&mut self, hints: &HintSet) {
        self.hints = hints.clone();
    }

    fn decode(&mut self, bits: &BitMatrix) -> Result<Option<DecodeResult>, EngineError> {
        if bits.width() == 0 || bits.height() == 0 {
            return Err(EngineError::InvalidInput(format!(
                "empty bit matrix {}x{}",
                bits.width(),
                bits.height()
            )));
        }

        let mut last_error = None;
        for reader in &mut self.readers {
            if !reader.symbologies().iter().any(|&s| self.hints.allows(s)) {
                continue;
            }
            match reader.decode(bits, &self.hints) {
                Ok(Some(result)) => return Ok(Some(result)),
                Ok(None) => {}
                Err(err) => last_error = Some(err),
            }
        }

        match last_error {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.hints = HintSet::all();
        for reader in &mut self.readers {
            reader.reset();
        }
    }
}
