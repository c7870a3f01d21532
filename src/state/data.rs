/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the scan pipeline and the UI layer.

use cgmath::Point2;
use std::fmt;
use std::path::PathBuf;

/// One eligible image inside the selected folder
///
/// Created at folder-scan time and never mutated afterwards; the scan
/// pipeline processes files in the order they were enumerated.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    /// Filename only (e.g., "IMG_0001.png")
    pub name: String,
    /// Full path to the image file
    pub path: PathBuf,
}

/// A barcode/QR symbol encoding standard requested for detection
///
/// Display names follow the ZXing naming the report format uses
/// (e.g. "QRCode", "EAN-13").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolFormat {
    QrCode,
    DataMatrix,
    Aztec,
    Pdf417,
    Ean8,
    Ean13,
    UpcA,
    UpcE,
    Code39,
    Code93,
    Code128,
    Itf,
    Codabar,
}

impl SymbolFormat {
    /// Every format the scanner can be asked to look for
    pub const ALL: [SymbolFormat; 13] = [
        SymbolFormat::QrCode,
        SymbolFormat::DataMatrix,
        SymbolFormat::Aztec,
        SymbolFormat::Pdf417,
        SymbolFormat::Ean8,
        SymbolFormat::Ean13,
        SymbolFormat::UpcA,
        SymbolFormat::UpcE,
        SymbolFormat::Code39,
        SymbolFormat::Code93,
        SymbolFormat::Code128,
        SymbolFormat::Itf,
        SymbolFormat::Codabar,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SymbolFormat::QrCode => "QRCode",
            SymbolFormat::DataMatrix => "DataMatrix",
            SymbolFormat::Aztec => "Aztec",
            SymbolFormat::Pdf417 => "PDF417",
            SymbolFormat::Ean8 => "EAN-8",
            SymbolFormat::Ean13 => "EAN-13",
            SymbolFormat::UpcA => "UPC-A",
            SymbolFormat::UpcE => "UPC-E",
            SymbolFormat::Code39 => "Code39",
            SymbolFormat::Code93 => "Code93",
            SymbolFormat::Code128 => "Code128",
            SymbolFormat::Itf => "ITF",
            SymbolFormat::Codabar => "Codabar",
        }
    }
}

impl fmt::Display for SymbolFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four-corner pixel-coordinate polygon bounding a located symbol
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub top_left: Point2<f32>,
    pub top_right: Point2<f32>,
    pub bottom_right: Point2<f32>,
    pub bottom_left: Point2<f32>,
}

impl Quad {
    /// Build an axis-aligned quad from a bounding rectangle
    pub fn from_bounds(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Quad {
            top_left: Point2::new(min_x, min_y),
            top_right: Point2::new(max_x, min_y),
            bottom_right: Point2::new(max_x, max_y),
            bottom_left: Point2::new(min_x, max_y),
        }
    }

    /// Corners in stroke order: topLeft → topRight → bottomRight → bottomLeft
    pub fn corners(&self) -> [Point2<f32>; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// The largest y-coordinate among the four corners
    pub fn max_y(&self) -> f32 {
        self.corners()
            .iter()
            .map(|p| p.y)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Midpoint x between the topLeft and topRight corners
    pub fn top_center_x(&self) -> f32 {
        (self.top_left.x + self.top_right.x) / 2.0
    }
}

/// One located (possibly undecodable) barcode region
///
/// `is_valid = false` means the symbol was found but could not be decoded;
/// in that case `error` carries the engine's message. Invalid candidates
/// are data, never errors — they flow through the pipeline like any other.
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeCandidate {
    pub format: SymbolFormat,
    pub text: String,
    pub is_valid: bool,
    pub error: String,
    pub position: Quad,
}

/// True when a detection result is non-empty and every candidate decoded
///
/// Drives the preview tint: green only for a fully decoded image, red for
/// anything else (including "nothing found").
pub fn all_valid(candidates: &[BarcodeCandidate]) -> bool {
    !candidates.is_empty() && candidates.iter().all(|c| c.is_valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(is_valid: bool) -> BarcodeCandidate {
        BarcodeCandidate {
            format: SymbolFormat::QrCode,
            text: String::from("HELLO"),
            is_valid,
            error: if is_valid {
                String::new()
            } else {
                String::from("checksum error")
            },
            position: Quad::from_bounds(10.0, 10.0, 50.0, 40.0),
        }
    }

    #[test]
    fn test_all_valid_requires_nonempty() {
        assert!(!all_valid(&[]));
        assert!(all_valid(&[candidate(true)]));
        assert!(!all_valid(&[candidate(true), candidate(false)]));
    }

    #[test]
    fn test_quad_geometry() {
        let quad = Quad::from_bounds(10.0, 10.0, 50.0, 40.0);
        assert_eq!(quad.max_y(), 40.0);
        assert_eq!(quad.top_center_x(), 30.0);
        assert_eq!(quad.corners()[2], Point2::new(50.0, 40.0));
    }

    #[test]
    fn test_format_names_match_report_strings() {
        assert_eq!(SymbolFormat::QrCode.to_string(), "QRCode");
        assert_eq!(SymbolFormat::Ean13.to_string(), "EAN-13");
        assert_eq!(SymbolFormat::ALL.len(), 13);
    }
}
