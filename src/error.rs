use thiserror::Error;

#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidImage { width: u32, height: u32 },

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("No image loaded")]
    NoImage,

    #[error("Palette index {index} out of range (palette has {len} entries)")]
    PaletteIndex { index: usize, len: usize },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Failed to allocate surface: {width}x{height}")]
    SurfaceAllocation { width: u32, height: u32 },

    #[error("PNG encode error: {0}")]
    PngEncode(String),
}

pub type Result<T> = std::result::Result<T, MosaicError>;
