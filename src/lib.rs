//! rust_qr_scan - adaptive QR and barcode decode pipeline
//!
//! Two entry points share one decoder:
//! - **Live frames**: [`FrameSession`] crops each frame to a region of
//!   interest, sweeps the luminance transform chain with two binarization
//!   strategies, zooms the camera in on small QR codes and hands the first read
//!   to the consumer through a single-result gate.
//! - **Still images**: [`decode_file`], [`decode_bytes`] and [`decode_bitmap`]
//!   run the same sweep once, without zoom or gating.
//!
//! ```no_run
//! use rust_qr_scan::{HintSet, decode_file};
//!
//! if let Some(result) = decode_file("code.png", &HintSet::all()) {
//!     println!("{}: {}", result.symbology(), result.text());
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Camera-control collaborator surface (zoom steps)
pub mod camera;
/// Decode and session configuration
pub mod config;
/// Multi-strategy decoder and the analyzer seam
pub mod decoder;
/// Symbol readers behind the decode-engine seam
pub mod engine;
/// Crate-level errors
pub mod error;
/// Ambient light classification
pub mod light;
/// Luminance sources and the transform chain
pub mod luminance;
/// Core data structures (Frame, Region, BitMatrix, DecodeResult, ...)
pub mod models;
/// Region-of-interest selection
pub mod roi;
/// Live frame session, auto-zoom and result gate
pub mod session;
/// Still-image decode path
pub mod still;
/// Utility functions (grayscale, binarization, geometry)
pub mod utils;

pub use camera::{CameraControl, ZoomState};
pub use config::{DecodeConfig, HintSet, SessionConfig};
pub use decoder::{Analyzer, MultiFormatAnalyzer, MultiStrategyDecoder, Strategy};
pub use engine::{DecodeEngine, EngineError, MultiFormatReader};
pub use error::ScanError;
pub use luminance::{GrayLuminance, LuminanceSource};
pub use models::{BitMatrix, DecodeResult, Frame, Point, Region, Rotation, Symbology};
pub use roi::select_region;
pub use session::{
    Delivery, FrameOutcome, FrameSession, ResultReceiver, ScanConsumer, SessionEvent,
    SessionHandle, SessionObserver, SessionState,
};
pub use still::{ImageSource, StillImageDecoder, decode_bitmap, decode_bytes, decode_file};
