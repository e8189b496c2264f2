//! The mosaic session: one source image, its config and derived state.
//!
//! All mutation goes through [`MosaicSession::finish_load`],
//! [`MosaicSession::apply`] and [`MosaicSession::recolor`]. Each builds the new
//! state off to the side and commits only when every step succeeded, so a
//! failure leaves the previous grid, palette and preview in place.

use image::{Rgba, RgbaImage};
use palette::Srgb;

use crate::colors::{PaletteEntry, parse_hex};
use crate::config::{ExportOptions, MosaicConfig};
use crate::downsample::{PixelGrid, downsample};
use crate::error::{MosaicError, Result};
use crate::export::{self, ExportArtifact, ExportContext};
use crate::quantize::{ClusterAssignment, Quantization, quantize};
use crate::recolor;
use crate::render::{OverlayFlags, OverlayStyle, RenderLayout, render_mosaic};
use crate::source::{SourceImage, decode_png};
use crate::stats::MosaicStats;

/// Issued by [`MosaicSession::begin_load`]; identifies one upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    /// Rebuild a ticket from a generation handed out earlier (e.g. across the JS boundary).
    pub fn from_generation(generation: u64) -> Self {
        Self { generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Decode `bytes`, tagging the outcome with this ticket's generation.
    pub fn decode(self, bytes: &[u8]) -> DecodedImage {
        DecodedImage {
            generation: self.generation,
            result: decode_png(bytes),
        }
    }
}

/// A finished decode, successful or not.
#[derive(Debug)]
pub struct DecodedImage {
    pub generation: u64,
    pub result: Result<SourceImage>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    Installed,
    /// A newer load began after this one; nothing was changed.
    Stale,
}

/// One user edit to the configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigChange {
    TargetWidth(u32),
    ColorCount(usize),
    /// Turning the grid off also turns tile numbers off.
    ShowGrid(bool),
    ShowColorNumbers(bool),
    TileSize { value: f64, unit: String },
    TileCost { cost: f64, per: f64 },
    Currency(String),
    OutputUnit(String),
    Replace(MosaicConfig),
}

impl ConfigChange {
    fn applied_to(self, config: &MosaicConfig) -> MosaicConfig {
        let mut next = config.clone();
        match self {
            ConfigChange::TargetWidth(w) => next.target_width = w,
            ConfigChange::ColorCount(k) => next.color_count = k,
            ConfigChange::ShowGrid(on) => {
                next.show_grid = on;
                if !on {
                    next.show_color_numbers = false;
                }
            }
            ConfigChange::ShowColorNumbers(on) => next.show_color_numbers = on,
            ConfigChange::TileSize { value, unit } => {
                next.tile_size = value;
                next.tile_size_unit = unit;
            }
            ConfigChange::TileCost { cost, per } => {
                next.tile_cost = cost;
                next.tile_cost_per = per;
            }
            ConfigChange::Currency(symbol) => next.currency = symbol,
            ConfigChange::OutputUnit(unit) => next.output_unit = unit,
            ConfigChange::Replace(config) => next = config,
        }
        next
    }
}

#[derive(Clone, Debug)]
struct MosaicState {
    grid: PixelGrid,
    quantization: Quantization,
    preview: RgbaImage,
}

#[derive(Debug, Default)]
pub struct MosaicSession {
    config: MosaicConfig,
    generation: u64,
    source: Option<SourceImage>,
    state: Option<MosaicState>,
}

impl MosaicSession {
    pub fn new(config: MosaicConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Start a new upload. Any load begun earlier becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Install a decoded image unless a newer load has started since.
    pub fn finish_load(&mut self, decoded: DecodedImage) -> Result<LoadStatus> {
        if decoded.generation != self.generation {
            tracing::debug!(
                generation = decoded.generation,
                current = self.generation,
                "Discarding stale image load"
            );
            return Ok(LoadStatus::Stale);
        }

        let source = decoded.result?;
        let state = build_state(&source, &self.config)?;
        tracing::info!(
            width = source.width(),
            height = source.height(),
            colors = state.quantization.palette.len(),
            "Installed source image"
        );
        self.source = Some(source);
        self.state = Some(state);
        Ok(LoadStatus::Installed)
    }

    /// Begin, decode and finish a load in one call.
    pub fn load_png(&mut self, bytes: &[u8]) -> Result<LoadStatus> {
        let decoded = self.begin_load().decode(bytes);
        self.finish_load(decoded)
    }

    /// Apply one configuration change, regenerating only what it affects.
    pub fn apply(&mut self, change: ConfigChange) -> Result<()> {
        let next = change.applied_to(&self.config);
        let regenerate = next.target_width != self.config.target_width
            || next.color_count != self.config.color_count;
        let rerender = next.show_grid != self.config.show_grid
            || next.show_color_numbers != self.config.show_color_numbers;

        if let Some(source) = &self.source {
            if regenerate {
                tracing::debug!(
                    target_width = next.target_width,
                    color_count = next.color_count,
                    "Regenerating mosaic"
                );
                self.state = Some(build_state(source, &next)?);
            } else if rerender {
                if let Some(state) = self.state.as_mut() {
                    state.preview =
                        render_preview(source, &state.grid, &state.quantization.assignment, &next)?;
                }
            }
        }
        self.config = next;
        Ok(())
    }

    /// Change palette entry `index` to `color` and repaint its tiles.
    pub fn recolor(&mut self, index: usize, color: Srgb<u8>) -> Result<()> {
        let source = self.source.as_ref().ok_or(MosaicError::NoImage)?;
        let state = self.state.as_mut().ok_or(MosaicError::NoImage)?;

        let mut grid = state.grid.clone();
        let mut palette = state.quantization.palette.clone();
        let assignment = &state.quantization.assignment;
        let repainted = recolor::recolor(&mut grid, &mut palette, assignment, index, color)?;
        let preview = render_preview(source, &grid, assignment, &self.config)?;
        tracing::debug!(index, repainted, "Recolored palette entry");

        state.grid = grid;
        state.quantization.palette = palette;
        state.preview = preview;
        Ok(())
    }

    pub fn recolor_hex(&mut self, index: usize, hex: &str) -> Result<()> {
        self.recolor(index, parse_hex(hex)?)
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn grid(&self) -> Option<&PixelGrid> {
        self.state.as_ref().map(|s| &s.grid)
    }

    /// Current palette; empty before an image is loaded.
    pub fn palette(&self) -> &[PaletteEntry] {
        self.state
            .as_ref()
            .map(|s| s.quantization.palette.as_slice())
            .unwrap_or_default()
    }

    pub fn assignment(&self) -> Option<&ClusterAssignment> {
        self.state.as_ref().map(|s| &s.quantization.assignment)
    }

    /// The last successfully rendered preview.
    pub fn preview(&self) -> Option<&RgbaImage> {
        self.state.as_ref().map(|s| &s.preview)
    }

    pub fn stats(&self) -> Option<MosaicStats> {
        self.source
            .as_ref()
            .map(|s| MosaicStats::compute(&self.config, s.width(), s.height()))
    }

    pub fn export(&self, options: &ExportOptions) -> Result<ExportArtifact> {
        let source = self.source.as_ref().ok_or(MosaicError::NoImage)?;
        let ctx = ExportContext {
            source,
            config: &self.config,
            palette: self.palette(),
        };
        export::export(&ctx, options)
    }
}

fn build_state(source: &SourceImage, config: &MosaicConfig) -> Result<MosaicState> {
    let mut grid = downsample(source, config.target_width)?;
    let quantization = quantize(&mut grid, config.color_count);
    let preview = render_preview(source, &grid, &quantization.assignment, config)?;
    Ok(MosaicState {
        grid,
        quantization,
        preview,
    })
}

/// Preview at 1× over the source's own size; tile numbers need the grid.
fn render_preview(
    source: &SourceImage,
    grid: &PixelGrid,
    assignment: &ClusterAssignment,
    config: &MosaicConfig,
) -> Result<RgbaImage> {
    let flags = OverlayFlags {
        show_grid: config.show_grid,
        show_color_numbers: config.show_grid && config.show_color_numbers,
    };
    let layout = RenderLayout::new(
        grid.width(),
        grid.height(),
        source.width(),
        source.height(),
        1,
        flags,
    );
    render_mosaic(
        grid,
        Some(assignment),
        &layout,
        flags,
        &OverlayStyle::default(),
        Rgba([0, 0, 0, 0]),
    )
}
