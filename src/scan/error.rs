/// Error types for the scan pipeline
///
/// File-level failures are fatal to the whole batch; a located symbol that
/// merely failed to decode is data (see `BarcodeCandidate::error`), never
/// one of these.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The declared media type is not a supported image type
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The image file could not be read from disk
    #[error("failed to read image: {0}")]
    Read(#[from] std::io::Error),

    /// The bytes could not be decoded into a pixel buffer
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The barcode engine failed in an unexpected way
    #[error("barcode engine error: {0}")]
    Detector(String),

    /// A new run was requested while one is in progress
    #[error("a scan is already running")]
    AlreadyRunning,
}
