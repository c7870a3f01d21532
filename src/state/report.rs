/// The exportable scan report
///
/// A read-only projection of a ScanJob's results, serialized to JSON on
/// demand. The field names (including `idValid`) are part of the export
/// format consumed downstream — do not rename them.

use serde::{Deserialize, Serialize};

use super::job::ScanJob;

/// One decoded (or located-but-undecodable) symbol in the report
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BarcodeData {
    #[serde(rename = "idValid")]
    pub id_valid: bool,
    pub format: String,
    pub text: String,
}

/// All symbols found in one file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub file: String,
    pub barcodes: Vec<BarcodeData>,
}

/// The full per-run report: one entry per processed file, in job order
///
/// Serializes as a flat JSON array of entries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    /// Project a job's accumulated results into the report structure
    ///
    /// Entries follow the job's file order. Files the run never reached
    /// (aborted before them) have no results entry and are omitted.
    pub fn from_job(job: &ScanJob) -> Self {
        let entries = job
            .files
            .iter()
            .filter_map(|file| {
                job.results.get(&file.name).map(|candidates| ReportEntry {
                    file: file.name.clone(),
                    barcodes: candidates
                        .iter()
                        .map(|c| BarcodeData {
                            id_valid: c.is_valid,
                            format: c.format.to_string(),
                            text: c.text.clone(),
                        })
                        .collect(),
                })
            })
            .collect();

        Report { entries }
    }

    /// Convert to pretty-printed JSON for export
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a previously exported report
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
