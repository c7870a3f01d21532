/// Batch scan orchestration
///
/// One pipeline task processes the job's files strictly one at a time:
/// fetch → decode → dual-pass resolve → preview overlay → record → progress.
/// Observers (the UI) watch through a one-way event channel; the job itself
/// is owned exclusively by the pipeline while it is Running.
///
/// A file-level failure aborts the whole run and leaves the results
/// accumulated so far readable. Symbol-level decode failures are data and
/// never abort anything.

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task;

use super::decoder::{self, PixelBuffer};
use super::engine::BarcodeEngine;
use super::error::ScanError;
use super::overlay;
use super::resolver;
use crate::state::data::{BarcodeCandidate, ImageFile, SymbolFormat};
use crate::state::job::{JobStatus, ScanJob};
use crate::state::report::Report;

/// The progress bar starts slightly above zero so a freshly started run
/// is visibly alive; progress never decreases below it afterwards
const PROGRESS_SEED: f32 = 1.0;

/// Everything the UI needs to show one processed file
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub file: ImageFile,
    /// Full-resolution buffer, retained for inspection overlays
    pub buffer: Arc<PixelBuffer>,
    pub candidates: Vec<BarcodeCandidate>,
    /// Pre-rendered tinted preview for the result grid
    pub preview: PixelBuffer,
    /// Job progress after this file, in [0, 100]
    pub progress: f32,
}

/// One-way notifications from the pipeline to its observers
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Started {
        total: usize,
    },
    FileScanned(ScannedFile),
    Finished {
        report: Report,
    },
    /// The run aborted at `file`; `report` covers the files before it
    Failed {
        file: String,
        error: String,
        report: Report,
    },
}

/// Run a scan job to completion (or to its first fatal error)
///
/// Returns the aggregated report on success. On failure the job is left
/// `Failed` with partial results; `AlreadyRunning` is rejected without
/// touching any state.
pub async fn run(
    job: &mut ScanJob,
    engine: Arc<dyn BarcodeEngine>,
    events: &UnboundedSender<ScanEvent>,
) -> Result<Report, ScanError> {
    if job.status == JobStatus::Running {
        return Err(ScanError::AlreadyRunning);
    }

    job.status = JobStatus::Running;
    job.results.clear();
    job.progress = PROGRESS_SEED;

    let total = job.files.len();
    let _ = events.send(ScanEvent::Started { total });
    println!("🔍 Scanning {} file(s)...", total);

    let files = job.files.clone();
    for (index, file) in files.iter().enumerate() {
        let scanned = match process_file(file, &job.formats, Arc::clone(&engine)).await {
            Ok(scanned) => scanned,
            Err(err) => {
                job.status = JobStatus::Failed;
                eprintln!("❌ Scan aborted at '{}': {}", file.name, err);
                let _ = events.send(ScanEvent::Failed {
                    file: file.name.clone(),
                    error: err.to_string(),
                    report: Report::from_job(job),
                });
                return Err(err);
            }
        };

        job.results
            .insert(file.name.clone(), scanned.candidates.clone());

        // Progress only ever moves forward, even past the seed value
        let processed = (index + 1) as f32;
        job.progress = job.progress.max(100.0 * processed / total as f32);

        let _ = events.send(ScanEvent::FileScanned(ScannedFile {
            progress: job.progress,
            ..scanned
        }));

        // Hand control back to the host event loop between files so the
        // UI stays responsive and can observe progress
        task::yield_now().await;
    }

    job.progress = 100.0;
    job.status = JobStatus::Completed;

    let report = Report::from_job(job);
    println!(
        "✅ Scan complete: {} file(s), {} with symbols",
        total,
        report
            .entries
            .iter()
            .filter(|e| !e.barcodes.is_empty())
            .count()
    );
    let _ = events.send(ScanEvent::Finished {
        report: report.clone(),
    });

    Ok(report)
}

/// Fetch one image's raw bytes plus its declared media type
///
/// The media type is derived from the extension and checked before any
/// bytes are read, so a non-image entry fails fast.
pub async fn fetch_image(file: &ImageFile) -> Result<(Vec<u8>, &'static str), ScanError> {
    let media_type = decoder::media_type_for_path(&file.path)
        .ok_or_else(|| ScanError::UnsupportedFormat(file.path.display().to_string()))?;

    let bytes = tokio::fs::read(&file.path).await?;
    Ok((bytes, media_type))
}

/// Decode, resolve and preview one file
///
/// The CPU-bound work (decode + both detection passes + preview) runs in
/// one blocking task so the event loop is never starved.
async fn process_file(
    file: &ImageFile,
    formats: &[SymbolFormat],
    engine: Arc<dyn BarcodeEngine>,
) -> Result<ScannedFile, ScanError> {
    let (bytes, media_type) = fetch_image(file).await?;

    let formats = formats.to_vec();
    let (buffer, candidates, preview) = task::spawn_blocking(move || {
        let buffer = decoder::decode(&bytes, media_type)?;
        let candidates =
            resolver::resolve(&buffer, &formats, engine.as_ref()).map_err(ScanError::Detector)?;
        let preview = overlay::render_preview(&buffer, &candidates);
        Ok::<_, ScanError>((buffer, candidates, preview))
    })
    .await
    .map_err(|e| ScanError::Detector(format!("Task join error: {}", e)))??;

    Ok(ScannedFile {
        file: file.clone(),
        buffer: Arc::new(buffer),
        candidates,
        preview,
        progress: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::engine::testing::ScriptedEngine;
    use crate::state::data::Quad;
    use crate::state::report::{BarcodeData, ReportEntry};
    use std::io::Cursor;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbImage::from_pixel(width, height, image::Rgb([240, 240, 240]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .expect("in-memory JPEG encode");
        bytes
    }

    fn scratch_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "barcode-scanner-{}-{}",
            label,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    fn write_file(dir: &PathBuf, name: &str, bytes: &[u8]) -> ImageFile {
        let path = dir.join(name);
        std::fs::write(&path, bytes).expect("write fixture");
        ImageFile {
            name: name.to_string(),
            path,
        }
    }

    fn qr_candidate(text: &str) -> BarcodeCandidate {
        BarcodeCandidate {
            format: SymbolFormat::QrCode,
            text: text.to_string(),
            is_valid: true,
            error: String::new(),
            position: Quad::from_bounds(10.0, 10.0, 50.0, 40.0),
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ScanEvent>) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_run_completes_with_progress_and_report() {
        let dir = scratch_dir("complete");
        let files = vec![
            write_file(&dir, "a.png", &decoder::png_bytes(16, 16)),
            write_file(&dir, "b.jpg", &jpeg_bytes(16, 16)),
        ];
        let mut job = ScanJob::new(files, vec![SymbolFormat::QrCode]);

        // a.png: local-average pass decodes one symbol; b.jpg: both passes empty
        let engine = Arc::new(ScriptedEngine::new(vec![
            Ok(vec![qr_candidate("HELLO")]),
            Ok(Vec::new()),
            Ok(Vec::new()),
            Ok(Vec::new()),
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let report = run(&mut job, engine, &tx).await.unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100.0);
        assert_eq!(
            report.entries,
            vec![
                ReportEntry {
                    file: String::from("a.png"),
                    barcodes: vec![BarcodeData {
                        id_valid: true,
                        format: String::from("QRCode"),
                        text: String::from("HELLO"),
                    }],
                },
                ReportEntry {
                    file: String::from("b.jpg"),
                    barcodes: Vec::new(),
                },
            ]
        );

        let events = drain(&mut rx);
        let progress: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::FileScanned(scanned) => Some(scanned.progress),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![50.0, 100.0]);
        assert!(matches!(events.first(), Some(ScanEvent::Started { total: 2 })));
        assert!(matches!(events.last(), Some(ScanEvent::Finished { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_decode_failure_aborts_the_whole_run() {
        let dir = scratch_dir("abort");
        let files = vec![
            write_file(&dir, "a.png", &decoder::png_bytes(16, 16)),
            write_file(&dir, "broken.png", b"definitely not a png"),
            write_file(&dir, "c.png", &decoder::png_bytes(16, 16)),
        ];
        let mut job = ScanJob::new(files, vec![SymbolFormat::QrCode]);

        let engine = Arc::new(ScriptedEngine::new(vec![
            Ok(vec![qr_candidate("ONE")]),
            Ok(Vec::new()),
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let result = run(&mut job, engine, &tx).await;

        assert!(matches!(result, Err(ScanError::Decode(_))));
        assert_eq!(job.status, JobStatus::Failed);

        // Files before the failure keep their results; nothing after it ran
        assert_eq!(job.results.len(), 1);
        assert!(job.results.contains_key("a.png"));
        assert!(!job.results.contains_key("c.png"));

        let events = drain(&mut rx);
        assert!(matches!(
            events.last(),
            Some(ScanEvent::Failed { file, .. }) if file == "broken.png"
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_detector_failure_aborts_the_whole_run() {
        let dir = scratch_dir("detector-abort");
        let files = vec![write_file(&dir, "a.png", &decoder::png_bytes(16, 16))];
        let mut job = ScanJob::new(files, vec![SymbolFormat::QrCode]);

        let engine = Arc::new(ScriptedEngine::new(vec![Err(String::from(
            "engine exploded",
        ))]));
        let (tx, _rx) = mpsc::unbounded_channel();

        let result = run(&mut job, engine, &tx).await;

        assert!(matches!(result, Err(ScanError::Detector(_))));
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.results.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_running_job_is_rejected() {
        let mut job = ScanJob::new(Vec::new(), vec![SymbolFormat::QrCode]);
        job.status = JobStatus::Running;
        job.progress = 42.0;

        let engine = Arc::new(ScriptedEngine::new(Vec::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let result = run(&mut job, engine, &tx).await;

        assert!(matches!(result, Err(ScanError::AlreadyRunning)));
        // Rejected with no state change and no events
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.progress, 42.0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_gate_rejects_non_image_before_reading() {
        // The path does not exist; the media-type gate must fire first
        let file = ImageFile {
            name: String::from("notes.txt"),
            path: PathBuf::from("/nonexistent/notes.txt"),
        };

        let result = fetch_image(&file).await;

        assert!(matches!(result, Err(ScanError::UnsupportedFormat(_))));
    }
}
