/// Dual-pass detection resolution
///
/// Every image is scanned twice, once per binarizer strategy, and one
/// pass's result set is chosen wholesale. The precedence is asymmetric
/// on purpose: the local-average pass wins whenever it decoded at least
/// one symbol, and the global-histogram pass is a fallback taken verbatim
/// — even when it found nothing either. The two passes are never merged
/// or re-validated against each other.

use super::decoder::PixelBuffer;
use super::engine::{BarcodeEngine, BinarizerStrategy};
use crate::state::data::{BarcodeCandidate, SymbolFormat};

/// Run both detection passes and pick the authoritative candidate set
pub fn resolve(
    buffer: &PixelBuffer,
    formats: &[SymbolFormat],
    engine: &dyn BarcodeEngine,
) -> Result<Vec<BarcodeCandidate>, String> {
    let pass_a = engine.detect(buffer, formats, BinarizerStrategy::LocalAverage)?;
    let pass_b = engine.detect(buffer, formats, BinarizerStrategy::GlobalHistogram)?;

    if pass_a.iter().any(|c| c.is_valid) {
        Ok(pass_a)
    } else {
        Ok(pass_b)
    }
}
