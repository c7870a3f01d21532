/// Overlay rendering for scan results
///
/// Two modes, both pure functions of a pixel buffer and its detection
/// result:
/// - Preview: a small tinted thumbnail for the result grid (green when
///   everything decoded, red otherwise)
/// - Full: the native-resolution image with each candidate outlined and
///   labelled, drawn on inspection
///
/// Rendering failures never abort a batch; the worst case is an overlay
/// without labels (no usable font) plus a log line.

use ab_glyph::{FontVec, PxScale};
use cgmath::Point2;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;

use super::decoder::PixelBuffer;
use crate::state::data::{all_valid, BarcodeCandidate, Quad};

/// Size of the preview canvas (square bound, aspect preserved)
const PREVIEW_SIZE: u32 = 128;

/// Stroke width of the quad outline, matching the inspection view
const OUTLINE_WIDTH: i32 = 5;

const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Font used for overlay labels, loaded once at startup
///
/// The font path is explicit configuration; without one, a handful of
/// well-known system locations are tried.
pub struct OverlayFont {
    font: FontVec,
}

/// System font locations tried when no explicit path is configured
const FONT_CANDIDATES: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

impl OverlayFont {
    /// Load the label font from the configured path, or search the
    /// default locations
    pub fn load(configured: Option<&Path>) -> Result<Self, String> {
        let path = match configured {
            Some(path) => PathBuf::from(path),
            None => FONT_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .find(|p| p.exists())
                .ok_or_else(|| String::from("no usable label font found"))?,
        };

        let bytes =
            std::fs::read(&path).map_err(|e| format!("failed to read font {:?}: {}", path, e))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| format!("failed to parse font {:?}: {}", path, e))?;

        println!("🔤 Overlay label font: {}", path.display());
        Ok(OverlayFont { font })
    }
}

/// Label font size for an image of the given width
pub fn label_scale(image_width: u32) -> f32 {
    (image_width as f32 / 40.0).max(1.0)
}

/// Where the label's top-left corner goes for a quad and measured text width
///
/// Horizontally centered under the topLeft/topRight midpoint, vertically
/// just below the lowest corner of the quad.
pub fn label_origin(quad: &Quad, text_width: f32) -> Point2<f32> {
    Point2::new(
        quad.top_center_x() - text_width / 2.0,
        quad.max_y() + 1.0,
    )
}

/// The label string for a candidate: "format: text", or the error for a
/// located-but-undecodable symbol
pub fn label_text(candidate: &BarcodeCandidate) -> String {
    if candidate.is_valid {
        format!("{}: {}", candidate.format, candidate.text)
    } else {
        candidate.error.clone()
    }
}

/// Render the tinted preview thumbnail for the result grid
///
/// The buffer is scaled to fit 128×128 (aspect preserved, no letterbox
/// padding), then uniformly tinted at 20%: green when the result is
/// non-empty and fully valid, red otherwise.
pub fn render_preview(buffer: &PixelBuffer, candidates: &[BarcodeCandidate]) -> PixelBuffer {
    let small = DynamicImage::ImageRgba8(buffer.to_rgba_image())
        .resize(PREVIEW_SIZE, PREVIEW_SIZE, FilterType::Lanczos3)
        .to_rgba8();

    let tint = if all_valid(candidates) { GREEN } else { RED };
    let mut tinted = small;
    for pixel in tinted.pixels_mut() {
        for channel in 0..3 {
            let src = pixel.0[channel] as u16;
            let overlay = tint.0[channel] as u16;
            pixel.0[channel] = ((4 * src + overlay) / 5) as u8;
        }
    }

    PixelBuffer::from_rgba(tinted)
}

/// Render the full-resolution inspection overlay
///
/// Each candidate gets its quad stroked as a closed outline (green when
/// decoded, red when not) and, when a font is available, a label on a
/// white backing rectangle sized to the measured text.
pub fn render_full(
    buffer: &PixelBuffer,
    candidates: &[BarcodeCandidate],
    font: Option<&OverlayFont>,
) -> RgbaImage {
    let mut canvas = buffer.to_rgba_image();
    let scale = label_scale(buffer.width);

    for candidate in candidates {
        let color = if candidate.is_valid { GREEN } else { RED };

        let corners = candidate.position.corners();
        for i in 0..4 {
            let start = corners[i];
            let end = corners[(i + 1) % 4];
            draw_thick_segment(&mut canvas, start, end, color);
        }

        if let Some(overlay_font) = font {
            draw_label(&mut canvas, candidate, scale, &overlay_font.font, color);
        }
    }

    canvas
}

/// Async wrapper so the full-resolution render never blocks the UI loop
pub async fn render_full_async(
    buffer: Arc<PixelBuffer>,
    candidates: Vec<BarcodeCandidate>,
    font: Option<Arc<OverlayFont>>,
) -> Result<PixelBuffer, String> {
    task::spawn_blocking(move || {
        let rendered = render_full(&buffer, &candidates, font.as_deref());
        Ok(PixelBuffer::from_rgba(rendered))
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

fn draw_label(
    canvas: &mut RgbaImage,
    candidate: &BarcodeCandidate,
    scale: f32,
    font: &FontVec,
    color: Rgba<u8>,
) {
    let text = label_text(candidate);
    let px_scale = PxScale::from(scale);
    let (text_width, _) = text_size(px_scale, font, &text);

    let origin = label_origin(&candidate.position, text_width as f32);
    let x = origin.x.round() as i32;
    let y = origin.y.round() as i32;

    let backing = Rect::at(x, y).of_size(text_width.max(1), scale as u32 + 1);
    draw_filled_rect_mut(canvas, backing, WHITE);
    draw_text_mut(canvas, color, x, y, px_scale, font, &text);
}

/// Stroke one quad edge at the configured outline width
///
/// imageproc segments are 1px, so the segment is repeated at small
/// offsets along both axes.
fn draw_thick_segment(
    canvas: &mut RgbaImage,
    start: Point2<f32>,
    end: Point2<f32>,
    color: Rgba<u8>,
) {
    let half = OUTLINE_WIDTH / 2;
    for offset in -half..=half {
        let o = offset as f32;
        draw_line_segment_mut(canvas, (start.x + o, start.y), (end.x + o, end.y), color);
        draw_line_segment_mut(canvas, (start.x, start.y + o), (end.x, end.y + o), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::SymbolFormat;

    fn white_buffer(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer {
            width,
            height,
            samples: vec![255; (width * height * 4) as usize],
        }
    }

    fn candidate(is_valid: bool) -> BarcodeCandidate {
        BarcodeCandidate {
            format: SymbolFormat::QrCode,
            text: String::from("HELLO"),
            is_valid,
            error: String::from("checksum error"),
            position: Quad::from_bounds(10.0, 10.0, 50.0, 40.0),
        }
    }

    #[test]
    fn test_label_origin_centered_below_quad() {
        let quad = Quad::from_bounds(10.0, 10.0, 50.0, 40.0);
        let origin = label_origin(&quad, 20.0);

        // Centered on x = 30, immediately below the lowest corner y = 40
        assert_eq!(origin.x + 20.0 / 2.0, 30.0);
        assert_eq!(origin.y, 41.0);
    }

    #[test]
    fn test_label_text_uses_error_for_invalid() {
        assert_eq!(label_text(&candidate(true)), "QRCode: HELLO");
        assert_eq!(label_text(&candidate(false)), "checksum error");
    }

    #[test]
    fn test_preview_preserves_aspect_within_bounds() {
        let preview = render_preview(&white_buffer(400, 200), &[]);
        assert_eq!(preview.width, 128);
        assert_eq!(preview.height, 64);
    }

    #[test]
    fn test_preview_tint_green_only_when_fully_valid() {
        let valid = render_preview(&white_buffer(8, 8), &[candidate(true)]);
        // 20% green over white: green channel saturates, others drop
        assert_eq!(&valid.samples[0..3], &[204, 255, 204]);

        let empty = render_preview(&white_buffer(8, 8), &[]);
        assert_eq!(&empty.samples[0..3], &[255, 204, 204]);

        let mixed = render_preview(&white_buffer(8, 8), &[candidate(true), candidate(false)]);
        assert_eq!(&mixed.samples[0..3], &[255, 204, 204]);
    }

    #[test]
    fn test_full_overlay_strokes_quad_outline() {
        let rendered = render_full(&white_buffer(100, 100), &[candidate(true)], None);

        // On the top edge between topLeft (10,10) and topRight (50,10)
        assert_eq!(rendered.get_pixel(30, 10), &GREEN);
        // Inside the quad stays untouched
        assert_eq!(rendered.get_pixel(30, 25), &WHITE);

        let invalid = render_full(&white_buffer(100, 100), &[candidate(false)], None);
        assert_eq!(invalid.get_pixel(30, 10), &RED);
    }
}
