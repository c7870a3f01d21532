/// The scan job: the single batch of work a run operates on
///
/// Exactly one job may be Running at a time. While Running it is owned
/// exclusively by the pipeline; everyone else observes it through the
/// pipeline's event channel.

use std::collections::HashMap;

use super::data::{BarcodeCandidate, ImageFile, SymbolFormat};

/// Lifecycle of a scan job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Created but not started
    Idle,
    /// The pipeline is processing files
    Running,
    /// Every file was processed
    Completed,
    /// A file-level error aborted the run; partial results remain readable
    Failed,
}

/// One batch scan over an ordered list of files
#[derive(Debug, Clone)]
pub struct ScanJob {
    /// Files in the order established at folder-scan time
    pub files: Vec<ImageFile>,
    /// Symbol formats requested for this run
    pub formats: Vec<SymbolFormat>,
    /// Percentage in [0, 100]; never decreases within a run
    pub progress: f32,
    /// Per-file detection results, keyed by file name
    pub results: HashMap<String, Vec<BarcodeCandidate>>,
    pub status: JobStatus,
}

impl ScanJob {
    /// Create a fresh job for a file list and format selection
    pub fn new(files: Vec<ImageFile>, formats: Vec<SymbolFormat>) -> Self {
        ScanJob {
            files,
            formats,
            progress: 0.0,
            results: HashMap::new(),
            status: JobStatus::Idle,
        }
    }
}
