/// The barcode detection engine seam
///
/// The pipeline only ever talks to the narrow `BarcodeEngine` trait; the
/// rxing-backed adapter lives behind it. Engine configuration is an explicit
/// value injected at construction, not process-wide state.

use rxing::common::{GlobalHistogramBinarizer, HybridBinarizer};
use rxing::multi::{GenericMultipleBarcodeReader, MultipleBarcodeReader};
use rxing::{
    BarcodeFormat, BinaryBitmap, DecodeHintValue, DecodeHints, Luma8LuminanceSource,
    MultiFormatReader, Point,
};
use std::collections::HashSet;

use super::decoder::PixelBuffer;
use crate::state::data::{BarcodeCandidate, Quad, SymbolFormat};

/// Image-thresholding technique applied before symbol localization
///
/// Two strategies are run per image; see the resolver for how their
/// results are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarizerStrategy {
    /// Adaptive local-average thresholding (the preferred pass)
    LocalAverage,
    /// Global histogram thresholding (the fallback pass)
    GlobalHistogram,
}

/// Engine configuration, fixed at adapter construction time
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Spend more time searching for symbols
    pub try_harder: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { try_harder: true }
    }
}

/// Opaque detection capability
///
/// Implementations must not mutate the buffer and must be safe to invoke
/// sequentially multiple times per buffer. Concurrent invocation against
/// one instance is not assumed safe; the pipeline never does it.
///
/// An empty result means "no symbols found" and is not an error; an `Err`
/// is an unexpected engine failure and aborts the batch.
pub trait BarcodeEngine: Send + Sync {
    fn detect(
        &self,
        buffer: &PixelBuffer,
        formats: &[SymbolFormat],
        strategy: BinarizerStrategy,
    ) -> Result<Vec<BarcodeCandidate>, String>;
}

/// rxing-backed engine adapter
pub struct RxingEngine {
    config: EngineConfig,
}

impl RxingEngine {
    pub fn new(config: EngineConfig) -> Self {
        RxingEngine { config }
    }
}

impl BarcodeEngine for RxingEngine {
    fn detect(
        &self,
        buffer: &PixelBuffer,
        formats: &[SymbolFormat],
        strategy: BinarizerStrategy,
    ) -> Result<Vec<BarcodeCandidate>, String> {
        let source = Luma8LuminanceSource::new(buffer.to_luma(), buffer.width, buffer.height);

        let format_set: HashSet<BarcodeFormat> = formats.iter().map(|f| to_rxing(*f)).collect();
        let hints = DecodeHints::default()
            .with(DecodeHintValue::TryHarder(self.config.try_harder))
            .with(DecodeHintValue::PossibleFormats(format_set));

        let mut reader = GenericMultipleBarcodeReader::new(MultiFormatReader::default());
        let results = match strategy {
            BinarizerStrategy::LocalAverage => {
                let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));
                reader.decode_multiple_with_hints(&mut bitmap, &hints)
            }
            BinarizerStrategy::GlobalHistogram => {
                let mut bitmap = BinaryBitmap::new(GlobalHistogramBinarizer::new(source));
                reader.decode_multiple_with_hints(&mut bitmap, &hints)
            }
        };

        match results {
            Ok(results) => Ok(results
                .iter()
                .filter_map(|result| {
                    let format = from_rxing(result.getBarcodeFormat())?;
                    Some(BarcodeCandidate {
                        format,
                        text: result.getText().to_string(),
                        is_valid: true,
                        error: String::new(),
                        position: bounding_quad(result.getPoints(), buffer.width, buffer.height),
                    })
                })
                .collect()),
            // "Nothing found" is a normal outcome, not an engine failure
            Err(rxing::Exceptions::NotFoundException(_)) => Ok(Vec::new()),
            Err(err) => Err(err.to_string()),
        }
    }
}

/// Axis-aligned quad over the engine's reported result points
///
/// rxing reports per-format point sets (finder centers, edge points), not
/// always four corners, so the candidate position is their bounding box.
/// A result with no points covers the whole image.
fn bounding_quad(points: &[Point], width: u32, height: u32) -> Quad {
    if points.is_empty() {
        return Quad::from_bounds(0.0, 0.0, width as f32, height as f32);
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Quad::from_bounds(min_x, min_y, max_x, max_y)
}

fn to_rxing(format: SymbolFormat) -> BarcodeFormat {
    match format {
        SymbolFormat::QrCode => BarcodeFormat::QR_CODE,
        SymbolFormat::DataMatrix => BarcodeFormat::DATA_MATRIX,
        SymbolFormat::Aztec => BarcodeFormat::AZTEC,
        SymbolFormat::Pdf417 => BarcodeFormat::PDF_417,
        SymbolFormat::Ean8 => BarcodeFormat::EAN_8,
        SymbolFormat::Ean13 => BarcodeFormat::EAN_13,
        SymbolFormat::UpcA => BarcodeFormat::UPC_A,
        SymbolFormat::UpcE => BarcodeFormat::UPC_E,
        SymbolFormat::Code39 => BarcodeFormat::CODE_39,
        SymbolFormat::Code93 => BarcodeFormat::CODE_93,
        SymbolFormat::Code128 => BarcodeFormat::CODE_128,
        SymbolFormat::Itf => BarcodeFormat::ITF,
        SymbolFormat::Codabar => BarcodeFormat::CODABAR,
    }
}

/// Map an engine-reported format back to ours
///
/// The detection hints restrict the engine to requested formats, so this
/// only returns None for formats we never ask for.
fn from_rxing(format: &BarcodeFormat) -> Option<SymbolFormat> {
    match format {
        BarcodeFormat::QR_CODE => Some(SymbolFormat::QrCode),
        BarcodeFormat::DATA_MATRIX => Some(SymbolFormat::DataMatrix),
        BarcodeFormat::AZTEC => Some(SymbolFormat::Aztec),
        BarcodeFormat::PDF_417 => Some(SymbolFormat::Pdf417),
        BarcodeFormat::EAN_8 => Some(SymbolFormat::Ean8),
        BarcodeFormat::EAN_13 => Some(SymbolFormat::Ean13),
        BarcodeFormat::UPC_A => Some(SymbolFormat::UpcA),
        BarcodeFormat::UPC_E => Some(SymbolFormat::UpcE),
        BarcodeFormat::CODE_39 => Some(SymbolFormat::Code39),
        BarcodeFormat::CODE_93 => Some(SymbolFormat::Code93),
        BarcodeFormat::CODE_128 => Some(SymbolFormat::Code128),
        BarcodeFormat::ITF => Some(SymbolFormat::Itf),
        BarcodeFormat::CODABAR => Some(SymbolFormat::Codabar),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted engine for pipeline/resolver tests
    ///
    /// Each detect() call pops the next canned outcome, in call order
    /// (the pipeline is strictly sequential, so the order is stable).
    pub struct ScriptedEngine {
        outcomes: Mutex<VecDeque<Result<Vec<BarcodeCandidate>, String>>>,
        /// Strategies in the order they were requested
        pub calls: Mutex<Vec<BinarizerStrategy>>,
    }

    impl ScriptedEngine {
        pub fn new(outcomes: Vec<Result<Vec<BarcodeCandidate>, String>>) -> Self {
            ScriptedEngine {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl BarcodeEngine for ScriptedEngine {
        fn detect(
            &self,
            _buffer: &PixelBuffer,
            _formats: &[SymbolFormat],
            strategy: BinarizerStrategy,
        ) -> Result<Vec<BarcodeCandidate>, String> {
            self.calls.lock().unwrap().push(strategy);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }
}
