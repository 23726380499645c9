use super::LuminanceSource;
use std::fmt;

/// The transform that produced a candidate source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// The source as captured
    Identity,
    /// Logical NOT of every sample (light-on-dark codes)
    Inverted,
    /// Rotated 90° counter-clockwise (vertical linear codes)
    RotatedCcw,
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transform::Identity => "identity",
            Transform::Inverted => "inverted",
            Transform::RotatedCcw => "rotated-ccw",
        })
    }
}

/// One luminance source handed to the decoder
#[derive(Debug, Clone)]
pub struct Candidate<S> {
    /// How `source` was derived from the base
    pub transform: Transform,
    /// The derived source
    pub source: S,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Identity,
    Inverted,
    Rotated,
    Done,
}

/// Lazy, single-pass sequence of candidates: identity, inverted, and
/// rotated-ccw when the base source supports rotation.
///
/// A candidate is only built when `next` is called, so stopping iteration
/// after a successful decode skips the remaining transforms entirely.
#[derive(Debug)]
pub struct TransformChain<S> {
    base: S,
    stage: Stage,
}

impl<S: LuminanceSource> TransformChain<S> {
    /// Start a chain over `base`
    pub fn new(base: S) -> Self {
        Self {
            base,
            stage: Stage::Identity,
        }
    }
}

impl<S: LuminanceSource> Iterator for TransformChain<S> {
    type Item = Candidate<S>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.stage {
            Stage::Identity => {
                self.stage = Stage::Inverted;
                Some(Candidate {
                    transform: Transform::Identity,
                    source: self.base.clone(),
                })
            }
            Stage::Inverted => {
                self.stage = Stage::Rotated;
                Some(Candidate {
                    transform: Transform::Inverted,
                    source: self.base.invert(),
                })
            }
            Stage::Rotated => {
                self.stage = Stage::Done;
                if !self.base.is_rotate_supported() {
                    return None;
                }
                self.base
                    .rotate_counter_clockwise()
                    .map(|source| Candidate {
                        transform: Transform::RotatedCcw,
                        source,
                    })
            }
            Stage::Done => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rotated = usize::from(self.base.is_rotate_supported());
        match self.stage {
            Stage::Identity => (2, Some(2 + rotated)),
            Stage::Inverted => (1, Some(1 + rotated)),
            Stage::Rotated => (0, Some(rotated)),
            Stage::Done => (0, Some(0)),
        }
    }
}

impl<S: LuminanceSource> std::iter::FusedIterator for TransformChain<S> {}
