/// Result tiles and the inspection view
///
/// Every processed file becomes a tile: a small tinted preview in a
/// wrapping grid. Clicking a tile opens the inspection view with the
/// full-resolution overlay and a table of that file's candidates.

use iced::widget::image::Handle;
use iced::widget::{button, column, horizontal_space, mouse_area, row, text, Column};
use iced::{Alignment, Element, Length};
use iced_aw::Wrap;
use std::sync::Arc;

use crate::scan::decoder::PixelBuffer;
use crate::scan::pipeline::ScannedFile;
use crate::state::data::{all_valid, BarcodeCandidate};
use crate::Message;

/// One processed file in the result grid
///
/// Keeps the full-resolution buffer alive so the inspection overlay can
/// be drawn on demand; it is dropped with the tile.
#[derive(Debug, Clone)]
pub struct ScanTile {
    pub title: String,
    pub preview: Handle,
    pub buffer: Arc<PixelBuffer>,
    pub candidates: Vec<BarcodeCandidate>,
}

impl ScanTile {
    pub fn from_scanned(scanned: ScannedFile) -> Self {
        ScanTile {
            title: scanned.file.name,
            preview: handle_from_buffer(&scanned.preview),
            buffer: scanned.buffer,
            candidates: scanned.candidates,
        }
    }

    /// True when this file decoded completely (the green-tint case)
    pub fn fully_valid(&self) -> bool {
        all_valid(&self.candidates)
    }
}

/// Turn a pixel buffer into a displayable image handle
pub fn handle_from_buffer(buffer: &PixelBuffer) -> Handle {
    Handle::from_rgba(buffer.width, buffer.height, buffer.samples.clone())
}

/// The wrapping grid of preview tiles
pub fn tile_grid(tiles: &[ScanTile]) -> Element<'_, Message> {
    let elements: Vec<Element<'_, Message>> = tiles
        .iter()
        .enumerate()
        .map(|(index, tile)| {
            let preview = iced::widget::image(tile.preview.clone());
            let marker = if tile.fully_valid() { "✓" } else { "✗" };

            mouse_area(
                column![
                    preview,
                    text(format!("{} {}", marker, tile.title)).size(12),
                ]
                .spacing(4)
                .align_x(Alignment::Center),
            )
            .on_press(Message::Inspect(index))
            .into()
        })
        .collect();

    Wrap::with_elements(elements)
        .spacing(10.0)
        .line_spacing(10.0)
        .into()
}

/// The inspection view: full-resolution overlay plus a candidate table
pub fn inspect_view<'a>(tile: &'a ScanTile, overlay: &Handle) -> Element<'a, Message> {
    let header = row![
        text(&tile.title).size(20),
        horizontal_space(),
        button("Close").on_press(Message::CloseInspect),
    ]
    .align_y(Alignment::Center)
    .spacing(10);

    let mut table = Column::new().spacing(4).push(
        row![
            text("Valid").size(14).width(Length::Fixed(60.0)),
            text("Format").size(14).width(Length::Fixed(100.0)),
            text("Content").size(14).width(Length::Fill),
        ]
        .spacing(10),
    );

    for candidate in &tile.candidates {
        let content: &str = if candidate.is_valid {
            &candidate.text
        } else {
            &candidate.error
        };

        table = table.push(
            row![
                text(if candidate.is_valid { "Yes" } else { "No" })
                    .size(14)
                    .width(Length::Fixed(60.0)),
                text(candidate.format.name())
                    .size(14)
                    .width(Length::Fixed(100.0)),
                text(content).size(14).width(Length::Fill),
            ]
            .spacing(10),
        );
    }

    if tile.candidates.is_empty() {
        table = table.push(text("No symbols found").size(14));
    }

    let body = row![
        iced::widget::image(overlay.clone()).width(Length::FillPortion(2)),
        table.width(Length::FillPortion(1)),
    ]
    .spacing(20);

    column![header, body].spacing(10).into()
}
