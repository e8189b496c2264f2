//! Image → mosaic template engine.
//!
//! A source bitmap is downsampled to one pixel per tile, quantized with a
//! deterministic k-means to a small palette, and rendered with an optional
//! grid, axis indices and per-tile palette labels. Palette entries can be
//! recolored without re-clustering, and the whole mosaic can be exported as a
//! high-resolution PNG template with a palette legend and a size/cost table.
//!
//! [`MosaicSession`] ties the pipeline together; [`wasm::MosaicEngine`] exposes
//! it to JavaScript.

pub mod canvas;
pub mod colors;
pub mod config;
pub mod downsample;
pub mod error;
pub mod export;
pub mod font;
pub mod quantize;
pub mod recolor;
pub mod render;
pub mod session;
pub mod source;
pub mod stats;
pub mod units;
pub mod wasm;

pub use colors::PaletteEntry;
pub use config::{ExportOptions, MosaicConfig, Theme};
pub use downsample::{PixelGrid, downsample};
pub use error::{MosaicError, Result};
pub use export::{ExportArtifact, ExportContext};
pub use quantize::{ClusterAssignment, Quantization, quantize};
pub use render::{OverlayFlags, RenderLayout};
pub use session::{ConfigChange, DecodedImage, LoadStatus, LoadTicket, MosaicSession};
pub use source::{SourceImage, decode_png};
pub use stats::MosaicStats;
