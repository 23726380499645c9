//! Single-shot decoding of still images.
//!
//! Files and encoded bytes are downsampled by an integer factor before
//! decoding; in-memory bitmaps are decoded at full size. There is no zoom
//! and no gate: one image in, one optional result out.

use crate::config::{HintSet, still_max_height, still_max_width};
use crate::decoder::MultiStrategyDecoder;
use crate::engine::{DecodeEngine, MultiFormatReader};
use crate::error::ScanError;
use crate::luminance::GrayLuminance;
use crate::models::DecodeResult;
use crate::utils::geometry::{sample_size, subsample};
use image::{DynamicImage, GenericImageView};
use log::{debug, warn};
use std::path::Path;

/// Where a still image comes from
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    /// Image file on disk
    Path(&'a Path),
    /// Encoded image (PNG, JPEG, ...) in memory
    Bytes(&'a [u8]),
    /// Already decoded bitmap
    Bitmap(&'a DynamicImage),
}

impl<'a> From<&'a Path> for ImageSource<'a> {
    fn from(path: &'a Path) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a DynamicImage> for ImageSource<'a> {
    fn from(image: &'a DynamicImage) -> Self {
        Self::Bitmap(image)
    }
}

fn luminance(image: &DynamicImage, sample: u32) -> Result<GrayLuminance, ScanError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ScanError::EmptyImage { width, height });
    }

    let luma = image.to_luma8().into_raw();
    let (luma, w, h) = subsample(&luma, width as usize, height as usize, 1, sample as usize);
    if sample > 1 {
        debug!("downsampled {width}x{height} by {sample} to {w}x{h}");
    }
    GrayLuminance::new(luma, w, h).ok_or(ScanError::BufferSize {
        expected: w * h,
        actual: 0,
    })
}

fn decode_encoded(bytes: &[u8], max_width: u32, max_height: u32) -> Result<GrayLuminance, ScanError> {
    let image = image::load_from_memory(bytes)?;
    let (width, height) = image.dimensions();
    luminance(&image, sample_size(width, height, max_width, max_height))
}

/// Load `source` into a luminance plane, downsampling files and encoded
/// bytes to roughly `max_width` x `max_height`
pub fn load_luminance(
    source: ImageSource<'_>,
    max_width: u32,
    max_height: u32,
) -> Result<GrayLuminance, ScanError> {
    match source {
        ImageSource::Path(path) => {
            let bytes = std::fs::read(path).map_err(|source| ScanError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            decode_encoded(&bytes, max_width, max_height)
        }
        ImageSource::Bytes(bytes) => decode_encoded(bytes, max_width, max_height),
        ImageSource::Bitmap(image) => luminance(image, 1),
    }
}

/// Still-image decoder reusing one engine across calls
pub struct StillImageDecoder<E = MultiFormatReader> {
    decoder: MultiStrategyDecoder<E>,
    max_width: u32,
    max_height: u32,
}

impl StillImageDecoder<MultiFormatReader> {
    /// Decoder with the default engine and downsampling bounds
    pub fn new() -> Self {
        Self::with_engine(MultiFormatReader::new())
    }
}

impl Default for StillImageDecoder<MultiFormatReader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DecodeEngine> StillImageDecoder<E> {
    /// Decoder over a custom engine
    pub fn with_engine(engine: E) -> Self {
        Self {
            decoder: MultiStrategyDecoder::new(engine),
            max_width: still_max_width(),
            max_height: still_max_height(),
        }
    }

    /// Override the downsampling bounds
    pub fn with_max_size(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width.max(1);
        self.max_height = max_height.max(1);
        self
    }

    /// Decode `source`. Unreadable input is logged and reported as no result.
    pub fn decode<'a>(
        &mut self,
        source: impl Into<ImageSource<'a>>,
        hints: &HintSet,
    ) -> Option<DecodeResult> {
        let source = source.into();
        match load_luminance(source, self.max_width, self.max_height) {
            Ok(luminance) => self.decoder.decode(luminance, hints),
            Err(err) => {
                warn!("cannot decode still image: {err}");
                None
            }
        }
    }
}

/// Decode an image file
pub fn decode_file(path: impl AsRef<Path>, hints: &HintSet) -> Option<DecodeResult> {
    StillImageDecoder::new().decode(path.as_ref(), hints)
}

/// Decode an encoded image held in memory
pub fn decode_bytes(bytes: &[u8], hints: &HintSet) -> Option<DecodeResult> {
    StillImageDecoder::new().decode(ImageSource::Bytes(bytes), hints)
}

/// Decode a bitmap at full size
pub fn decode_bitmap(image: &DynamicImage, hints: &HintSet) -> Option<DecodeResult> {
    StillImageDecoder::new().decode(image, hints)
}
