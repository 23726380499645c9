//! Crate-level error type.
//!
//! Decode misses are never errors; they are `None`. `ScanError` covers the
//! faults around decoding: unreadable input, bad buffers and bad config.

use std::path::PathBuf;

/// Errors raised while loading input or configuration
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Reading a file failed
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The image could not be decoded
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// The image has a zero dimension
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage {
        /// Reported width
        width: u32,
        /// Reported height
        height: u32,
    },

    /// A pixel buffer does not match its declared dimensions
    #[error("pixel buffer holds {actual} bytes, {expected} expected for the declared size")]
    BufferSize {
        /// Bytes required
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// Configuration could not be parsed
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}
