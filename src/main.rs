use iced::futures::{future, SinkExt};
use iced::widget::image::Handle;
use iced::widget::{
    button, checkbox, column, container, progress_bar, row, scrollable, text, Column,
};
use iced::{stream, Alignment, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use walkdir::WalkDir;
use chrono::Local;

// Declare the application modules
mod scan;
mod state;
mod ui;

use scan::decoder::PixelBuffer;
use scan::engine::{BarcodeEngine, EngineConfig, RxingEngine};
use scan::overlay::{self, OverlayFont};
use scan::pipeline::{self, ScanEvent};
use state::data::{ImageFile, SymbolFormat};
use state::job::ScanJob;
use state::report::Report;
use ui::tile::{self, ScanTile};

/// A folder the user picked, with its eligible images in scan order
#[derive(Debug, Clone)]
struct SelectedFolder {
    path: PathBuf,
    files: Vec<ImageFile>,
}

/// A tile opened in the inspection view, with its rendered overlay
#[derive(Debug, Clone)]
struct Inspection {
    index: usize,
    overlay: Handle,
}

/// Main application state
struct BarcodeScanner {
    /// The detection engine, shared with the pipeline task
    engine: Arc<dyn BarcodeEngine>,
    /// Label font for inspection overlays (None = outlines only)
    font: Option<Arc<OverlayFont>>,
    folder: Option<SelectedFolder>,
    /// Formats requested for the next scan
    formats: Vec<SymbolFormat>,
    /// One tile per processed file, in scan order
    tiles: Vec<ScanTile>,
    scanning: bool,
    /// Mirrors the running job's progress percentage
    progress: f32,
    /// The exportable report of the last run (partial after a failure)
    report: Option<Report>,
    inspecting: Option<Inspection>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the "Select Folder" button
    SelectFolder,
    /// User toggled a symbol format checkbox
    ToggleFormat(SymbolFormat, bool),
    /// User clicked the "Scan" button
    StartScan,
    /// A notification arrived from the running pipeline
    ScanProgress(ScanEvent),
    /// User clicked a result tile
    Inspect(usize),
    /// The full-resolution overlay finished rendering
    InspectReady(usize, Result<PixelBuffer, String>),
    /// User closed the inspection view
    CloseInspect,
    /// User clicked the "Save Output" button
    ExportReport,
}

impl BarcodeScanner {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let engine: Arc<dyn BarcodeEngine> = Arc::new(RxingEngine::new(EngineConfig::default()));

        // Overlays degrade to outlines-only when no label font is usable
        let font = match OverlayFont::load(None) {
            Ok(font) => Some(Arc::new(font)),
            Err(err) => {
                eprintln!("⚠️  Overlay labels disabled: {}", err);
                None
            }
        };

        println!("🎯 Barcode Scanner initialized");

        (
            BarcodeScanner {
                engine,
                font,
                folder: None,
                formats: vec![SymbolFormat::QrCode],
                tiles: Vec::new(),
                scanning: false,
                progress: 0.0,
                report: None,
                inspecting: None,
                status: String::from("Ready. Select a folder to scan."),
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SelectFolder => {
                // Show the native folder picker dialog
                let folder = FileDialog::new()
                    .set_title("Select Folder with Images")
                    .pick_folder();

                if let Some(folder_path) = folder {
                    let files = enumerate_images(&folder_path);
                    self.status = format!(
                        "📁 {} eligible image(s) in {}",
                        files.len(),
                        folder_path.display()
                    );

                    // A new folder resets the previous run entirely
                    self.folder = Some(SelectedFolder {
                        path: folder_path,
                        files,
                    });
                    self.tiles.clear();
                    self.report = None;
                    self.inspecting = None;
                    self.progress = 0.0;
                }

                Task::none()
            }

            Message::ToggleFormat(format, enabled) => {
                if enabled {
                    if !self.formats.contains(&format) {
                        self.formats.push(format);
                    }
                } else {
                    self.formats.retain(|f| *f != format);
                }
                Task::none()
            }

            Message::StartScan => {
                if self.scanning {
                    self.status = String::from("⚠️  A scan is already running.");
                    return Task::none();
                }

                let Some(folder) = &self.folder else {
                    return Task::none();
                };
                if self.formats.is_empty() || folder.files.is_empty() {
                    return Task::none();
                }

                let job = ScanJob::new(folder.files.clone(), self.formats.clone());
                let engine = Arc::clone(&self.engine);

                self.scanning = true;
                self.progress = 0.0;
                self.tiles.clear();
                self.report = None;
                self.inspecting = None;
                self.status = format!("🔍 Scanning {} file(s)...", job.files.len());

                // The pipeline owns the job for the duration of the run;
                // the UI only sees it through the event channel
                Task::run(
                    stream::channel(32, move |mut output| async move {
                        let (tx, mut rx) = mpsc::unbounded_channel();

                        let scan = async move {
                            let mut job = job;
                            let _ = pipeline::run(&mut job, engine, &tx).await;
                            drop(tx);
                        };
                        let forward = async {
                            while let Some(event) = rx.recv().await {
                                let _ = output.send(event).await;
                            }
                        };

                        future::join(scan, forward).await;
                    }),
                    Message::ScanProgress,
                )
            }

            Message::ScanProgress(event) => {
                match event {
                    ScanEvent::Started { total } => {
                        self.status = format!("🔍 Scanning {} file(s)...", total);
                    }
                    ScanEvent::FileScanned(scanned) => {
                        self.progress = scanned.progress;
                        self.tiles.push(ScanTile::from_scanned(scanned));
                    }
                    ScanEvent::Finished { report } => {
                        self.scanning = false;
                        self.progress = 100.0;
                        self.status = format!(
                            "✅ Scan complete! {} file(s) processed.",
                            report.entries.len()
                        );
                        self.report = Some(report);
                    }
                    ScanEvent::Failed {
                        file,
                        error,
                        report,
                    } => {
                        self.scanning = false;
                        self.status = format!("❌ Scan failed at '{}': {}", file, error);
                        // Partial results stay visible and exportable
                        self.report = Some(report);
                    }
                }
                Task::none()
            }

            Message::Inspect(index) => {
                let Some(tile) = self.tiles.get(index) else {
                    return Task::none();
                };

                let buffer = Arc::clone(&tile.buffer);
                let candidates = tile.candidates.clone();
                let font = self.font.clone();

                Task::perform(
                    overlay::render_full_async(buffer, candidates, font),
                    move |result| Message::InspectReady(index, result),
                )
            }

            Message::InspectReady(index, result) => {
                let Some(tile) = self.tiles.get(index) else {
                    return Task::none();
                };

                let overlay = match result {
                    Ok(rendered) => tile::handle_from_buffer(&rendered),
                    Err(err) => {
                        // A failed overlay never blocks inspection; fall
                        // back to the plain image
                        eprintln!("⚠️  Overlay rendering failed for '{}': {}", tile.title, err);
                        tile::handle_from_buffer(&tile.buffer)
                    }
                };

                self.inspecting = Some(Inspection { index, overlay });
                Task::none()
            }

            Message::CloseInspect => {
                self.inspecting = None;
                Task::none()
            }

            Message::ExportReport => {
                let Some(report) = &self.report else {
                    return Task::none();
                };

                let default_name =
                    format!("scan-report-{}.json", Local::now().format("%Y%m%d-%H%M%S"));
                let target = FileDialog::new()
                    .set_title("Save Scan Report")
                    .set_file_name(&default_name)
                    .save_file();

                if let Some(path) = target {
                    match report.to_json() {
                        Ok(json) => match std::fs::write(&path, json) {
                            Ok(()) => {
                                println!("📊 Report saved to {}", path.display());
                                self.status = format!("✅ Report saved to {}", path.display());
                            }
                            Err(err) => {
                                eprintln!("⚠️  Failed to save report: {}", err);
                                self.status = format!("⚠️  Failed to save report: {}", err);
                            }
                        },
                        Err(err) => {
                            eprintln!("⚠️  Failed to serialize report: {}", err);
                            self.status = format!("⚠️  Failed to serialize report: {}", err);
                        }
                    }
                }

                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let mut format_list = Column::new().spacing(4);
        for format in SymbolFormat::ALL {
            format_list = format_list.push(
                checkbox(format.name(), self.formats.contains(&format))
                    .on_toggle(move |enabled| Message::ToggleFormat(format, enabled))
                    .size(16),
            );
        }

        let folder_info: Element<Message> = match &self.folder {
            Some(folder) => column![
                text(folder.path.display().to_string()).size(12),
                text(format!("{} file(s)", folder.files.len())).size(12),
            ]
            .spacing(2)
            .into(),
            None => text("No folder selected").size(12).into(),
        };

        let can_scan = !self.scanning
            && !self.formats.is_empty()
            && self
                .folder
                .as_ref()
                .is_some_and(|folder| !folder.files.is_empty());

        let mut controls = column![
            text("Barcode Scanner").size(28),
            text("Formats").size(16),
            format_list,
            button("Select Folder")
                .on_press_maybe((!self.scanning).then_some(Message::SelectFolder))
                .padding(10),
            folder_info,
            row![
                button("Scan")
                    .on_press_maybe(can_scan.then_some(Message::StartScan))
                    .padding(10),
                button("Save Output")
                    .on_press_maybe(self.report.is_some().then_some(Message::ExportReport))
                    .padding(10),
            ]
            .spacing(10),
        ]
        .spacing(15);

        if self.scanning {
            controls = controls.push(progress_bar(0.0..=100.0, self.progress));
        }

        controls = controls.push(text(&self.status).size(14));

        let results: Element<Message> = match &self.inspecting {
            Some(inspection) => tile::inspect_view(&self.tiles[inspection.index], &inspection.overlay),
            None => scrollable(tile::tile_grid(&self.tiles))
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
        };

        let content = row![
            container(controls)
                .width(Length::Fixed(280.0))
                .padding(10),
            container(results)
                .width(Length::Fill)
                .height(Length::Fill)
                .padding(10),
        ]
        .align_y(Alignment::Start)
        .spacing(10);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(10)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    iced::application(
        "Barcode Scanner",
        BarcodeScanner::update,
        BarcodeScanner::view,
    )
    .theme(BarcodeScanner::theme)
    .centered()
    .run_with(BarcodeScanner::new)
}

/// List a folder's eligible images, in stable name order
///
/// Only direct children with a png/jpg/jpeg extension qualify; everything
/// else in the folder is ignored.
fn enumerate_images(folder: &Path) -> Vec<ImageFile> {
    WalkDir::new(folder)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let path = entry.path().to_path_buf();
            let ext = path.extension()?.to_str()?.to_lowercase();
            if matches!(ext.as_str(), "png" | "jpg" | "jpeg") {
                Some(ImageFile {
                    name: entry.file_name().to_string_lossy().to_string(),
                    path,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_images_filters_and_sorts() {
        let dir = std::env::temp_dir().join(format!("barcode-scanner-enum-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        for name in ["b.jpg", "a.png", "notes.txt", "c.JPEG", "d.gif"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("sub").join("nested.png"), b"x").unwrap();

        let files = enumerate_images(&dir);
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();

        // Name order, images only, no recursion into subfolders
        assert_eq!(names, vec!["a.png", "b.jpg", "c.JPEG"]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
