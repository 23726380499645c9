//! Multi-strategy decoding over the luminance transform chain.
//!
//! One frame costs at most six engine calls: two binarization strategies for
//! each of up to three candidate sources. The sweep stops at the first read.

use crate::config::HintSet;
use crate::engine::{DecodeEngine, EngineError, MultiFormatReader};
use crate::luminance::{GrayLuminance, LuminanceSource, Transform, TransformChain};
use crate::models::{BitMatrix, DecodeResult, Point};
use crate::utils::binarization::{histogram_binarize, hybrid_binarize};
use log::{debug, warn};
use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Binarization strategy applied before handing a source to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Block-local thresholds, best on sharp edges
    Hybrid,
    /// One Otsu threshold from the global histogram, best under uneven light
    GlobalHistogram,
}

impl Strategy {
    /// Order in which strategies are tried on every source
    pub const ORDER: [Strategy; 2] = [Strategy::Hybrid, Strategy::GlobalHistogram];

    /// Binarize `source`
    pub fn binarize<S: LuminanceSource>(self, source: &S) -> BitMatrix {
        let (width, height) = (source.width(), source.height());
        let luma = source.matrix();
        match self {
            Strategy::Hybrid => hybrid_binarize(&luma, width, height),
            Strategy::GlobalHistogram => histogram_binarize(&luma, width, height),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Hybrid => "hybrid",
            Strategy::GlobalHistogram => "global-histogram",
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs both strategies over each candidate of a transform chain
pub struct MultiStrategyDecoder<E = MultiFormatReader> {
    engine: E,
}

impl Default for MultiStrategyDecoder<MultiFormatReader> {
    fn default() -> Self {
        Self::new(MultiFormatReader::new())
    }
}

impl<E: DecodeEngine> MultiStrategyDecoder<E> {
    /// Decoder driving `engine`
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// The wrapped engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Try each strategy on one source. Engine faults and panics count as a
    /// miss for that strategy.
    pub fn decode_source<S: LuminanceSource>(&mut self, source: &S) -> Option<DecodeResult> {
        for strategy in Strategy::ORDER {
            let engine = &mut self.engine;
            let attempt = catch_unwind(AssertUnwindSafe(|| {
                let bits = strategy.binarize(source);
                engine.decode(&bits)
            }))
            .unwrap_or_else(|payload| Err(EngineError::Panicked(panic_message(payload.as_ref()))));

            match attempt {
                Ok(Some(result)) => {
                    debug!("{strategy} strategy read {}", result.symbology());
                    return Some(result);
                }
                Ok(None) => {}
                Err(EngineError::Panicked(msg)) => {
                    warn!("decode engine panicked under {strategy} strategy: {msg}");
                }
                Err(err) => debug!("{strategy} strategy: {err}"),
            }
        }
        None
    }

    /// Full sweep over `source` and its derived candidates.
    ///
    /// Later candidates are only built if earlier ones fail. The engine is
    /// reset afterwards whatever the outcome.
    pub fn decode<S: LuminanceSource>(&mut self, source: S, hints: &HintSet) -> Option<DecodeResult> {
        self.engine.set_hints(hints);
        let base_width = source.width();

        let result = TransformChain::new(source).find_map(|candidate| {
            let result = self.decode_source(&candidate.source)?;
            debug!("read on {} source", candidate.transform);
            Some(match candidate.transform {
                // Map back from the rotated source: (x', y') came from (w - 1 - y', x')
                Transform::RotatedCcw => {
                    let last = base_width.saturating_sub(1) as f32;
                    result.map_points(|p| Point::new(last - p.y, p.x))
                }
                Transform::Identity | Transform::Inverted => result,
            })
        });

        self.engine.reset();
        result
    }
}

/// Pluggable per-frame decode logic
pub trait Analyzer: Send {
    /// Decode a cropped luminance plane
    fn analyze(&mut self, pixels: &[u8], width: usize, height: usize) -> Option<DecodeResult>;
}

impl<F> Analyzer for F
where
    F: FnMut(&[u8], usize, usize) -> Option<DecodeResult> + Send,
{
    fn analyze(&mut self, pixels: &[u8], width: usize, height: usize) -> Option<DecodeResult> {
        self(pixels, width, height)
    }
}

/// Default analyzer: the multi-strategy decoder with fixed hints
pub struct MultiFormatAnalyzer<E = MultiFormatReader> {
    decoder: MultiStrategyDecoder<E>,
    hints: HintSet,
}

impl MultiFormatAnalyzer<MultiFormatReader> {
    /// Analyzer over every supported reader
    pub fn new(hints: HintSet) -> Self {
        Self::with_engine(MultiFormatReader::new(), hints)
    }
}

impl<E: DecodeEngine> MultiFormatAnalyzer<E> {
    /// Analyzer over a custom engine
    pub fn with_engine(engine: E, hints: HintSet) -> Self {
        Self {
            decoder: MultiStrategyDecoder::new(engine),
            hints,
        }
    }

    /// Hints applied to every frame
    pub fn hints(&self) -> &HintSet {
        &self.hints
    }
}

impl<E: DecodeEngine + Send> Analyzer for MultiFormatAnalyzer<E> {
    fn analyze(&mut self, pixels: &[u8], width: usize, height: usize) -> Option<DecodeResult> {
        let Some(source) = GrayLuminance::new(Arc::<[u8]>::from(pixels), width, height) else {
            debug!("skipping unusable {width}x{height} plane ({} bytes)", pixels.len());
            return None;
        };
        self.decoder.decode(source, &self.hints)
    }
}
