//! Decoded source bitmaps.

use image::{GenericImageView, ImageFormat, RgbaImage};

use crate::error::{MosaicError, Result};

/// A decoded, read-only RGBA bitmap with non-zero dimensions.
#[derive(Clone, Debug)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(MosaicError::InvalidImage { width, height });
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Decode PNG bytes into a [`SourceImage`].
///
/// Upload validation normally rejects other formats before they get here;
/// this check keeps the core honest when called directly.
pub fn decode_png(bytes: &[u8]) -> Result<SourceImage> {
    let format = image::guess_format(bytes)
        .map_err(|e| MosaicError::UnsupportedFormat(e.to_string()))?;
    if format != ImageFormat::Png {
        return Err(MosaicError::UnsupportedFormat(format!("{format:?}")));
    }

    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| MosaicError::Decode(e.to_string()))?;
    let (width, height) = img.dimensions();
    tracing::debug!(width, height, "Decoded PNG source");

    SourceImage::from_rgba(img.to_rgba8())
}
