use super::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbologies the decode engine can be asked to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    /// QR Code (2-D, square finder patterns)
    QrCode,
    /// EAN-13 linear barcode
    Ean13,
    /// EAN-8 linear barcode
    Ean8,
    /// UPC-A linear barcode
    UpcA,
}

impl Symbology {
    /// Every supported symbology
    pub const ALL: [Symbology; 4] = [
        Symbology::QrCode,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
    ];

    /// True for the 2-D family whose geometry implies a square finder pattern
    pub fn is_two_dimensional(self) -> bool {
        matches!(self, Symbology::QrCode)
    }

    /// Stable lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Symbology::QrCode => "qr_code",
            Symbology::Ean13 => "ean_13",
            Symbology::Ean8 => "ean_8",
            Symbology::UpcA => "upc_a",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful read: text, symbology and detected geometry
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeResult {
    text: String,
    symbology: Symbology,
    points: Vec<Point>,
}

impl DecodeResult {
    /// Create a result
    pub fn new(text: impl Into<String>, symbology: Symbology, points: Vec<Point>) -> Self {
        Self {
            text: text.into(),
            symbology,
            points,
        }
    }

    /// Decoded text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Symbology the text was read from
    pub fn symbology(&self) -> Symbology {
        self.symbology
    }

    /// Geometry points in the coordinates of the analysed source
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Consume the result, returning its text
    pub fn into_text(self) -> String {
        self.text
    }

    /// Same result with every point passed through `f`
    pub fn map_points(mut self, f: impl Fn(Point) -> Point) -> Self {
        for p in &mut self.points {
            *p = f(*p);
        }
        self
    }
}

impl fmt::Display for DecodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.symbology, self.text)
    }
}
