/// Pixel decoding: raw image bytes → RGBA pixel buffer
///
/// The declared media type is checked before any decoding happens, so a
/// mis-labelled fetch fails fast with `UnsupportedFormat` rather than a
/// confusing decode error.

use image::{ImageFormat, RgbaImage};
use std::fmt;
use std::path::Path;

use super::error::ScanError;

/// A decoded rectangular pixel buffer (RGBA, row-major)
///
/// Owned by the pipeline step that decoded it and handed to the UI tile
/// for later full-resolution overlay drawing; dropped with the tile.
#[derive(Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// RGBA samples, `width * height * 4` bytes
    pub samples: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap a decoded RGBA image
    pub fn from_rgba(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        PixelBuffer {
            width,
            height,
            samples: image.into_raw(),
        }
    }

    /// Copy the samples back into an `image` buffer for drawing
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_raw(self.width, self.height, self.samples.clone())
            .expect("sample length matches dimensions")
    }

    /// Convert to 8-bit luminance for the barcode engine
    ///
    /// ITU-R BT.601 weights with integer math: (77R + 150G + 29B) >> 8
    pub fn to_luma(&self) -> Vec<u8> {
        let len = (self.width * self.height) as usize;
        let mut luma = Vec::with_capacity(len);
        for i in 0..len {
            let base = i * 4;
            let r = self.samples[base] as u32;
            let g = self.samples[base + 1] as u32;
            let b = self.samples[base + 2] as u32;
            luma.push(((77 * r + 150 * g + 29 * b) >> 8) as u8);
        }
        luma
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Decode raw bytes with the given declared media type
///
/// Deterministic: the same bytes always produce an identical buffer.
pub fn decode(bytes: &[u8], declared_media_type: &str) -> Result<PixelBuffer, ScanError> {
    let format = ImageFormat::from_mime_type(declared_media_type)
        .ok_or_else(|| ScanError::UnsupportedFormat(declared_media_type.to_string()))?;

    let image = image::load_from_memory_with_format(bytes, format)?;

    Ok(PixelBuffer::from_rgba(image.to_rgba8()))
}

/// Derive the media type from a file extension, like the original
/// folder scanner derives it before fetching
///
/// Returns None for anything that is not an eligible image extension.
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// Encode a tiny solid-color PNG entirely in memory (test fixture)
#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    use std::io::Cursor;

    let image = RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("in-memory PNG encode");
    bytes
}
