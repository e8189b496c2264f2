//! High-resolution template export: mosaic, palette legend and statistics.
//!
//! The exporter does not reuse the preview's buffers. It re-runs
//! downsampling and quantization from the session's source and config, which
//! is deterministic, then re-applies any palette colors the user changed so
//! the exported template matches what the preview shows.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::canvas::Canvas;
use crate::colors::{PaletteEntry, luminance};
use crate::config::{ExportOptions, MosaicConfig, Theme};
use crate::downsample::{PixelGrid, downsample};
use crate::error::{MosaicError, Result};
use crate::font;
use crate::quantize::{Quantization, quantize};
use crate::recolor::recolor;
use crate::render::{self, OverlayFlags, OverlayStyle, RenderLayout};
use crate::source::SourceImage;
use crate::stats::MosaicStats;

/// Longest mosaic side, in pixels, an export may have.
pub const MAX_EXPORT_SIDE: u32 = 8192;

const PALETTE_PANEL_MIN: u32 = 160;
const PALETTE_PANEL_MAX: u32 = 960;
const STATS_PANEL_MIN: u32 = 140;
const STATS_PANEL_MAX: u32 = 720;

/// Minimum swatch cell height / width ratio when wrapping the palette.
const SWATCH_ASPECT: f32 = 0.9;

/// Everything one export reads from the session.
#[derive(Clone, Copy, Debug)]
pub struct ExportContext<'a> {
    pub source: &'a SourceImage,
    pub config: &'a MosaicConfig,
    /// The session palette, including any recolored entries.
    pub palette: &'a [PaletteEntry],
}

/// An encoded template ready for download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ExportArtifact {
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

/// Largest scale not above `requested` that keeps the mosaic within
/// [`MAX_EXPORT_SIDE`] (never below 1).
pub fn effective_scale(requested: u32, source_width: u32, source_height: u32) -> u32 {
    let requested = requested.max(1);
    let longest = source_width.max(source_height).max(1);
    let limit = (MAX_EXPORT_SIDE / longest).max(1);
    if requested > limit {
        tracing::warn!(requested, limit, longest, "Reducing export scale");
        limit
    } else {
        requested
    }
}

pub fn palette_panel_height(mosaic_height: u32) -> u32 {
    ((mosaic_height as f64 * 0.25).round() as u32).clamp(PALETTE_PANEL_MIN, PALETTE_PANEL_MAX)
}

pub fn stats_panel_height(mosaic_height: u32) -> u32 {
    ((mosaic_height as f64 * 0.2).round() as u32).clamp(STATS_PANEL_MIN, STATS_PANEL_MAX)
}

/// Fresh grid and quantization for `ctx`, with the session's palette colors applied.
fn mosaic_state(ctx: &ExportContext<'_>) -> Result<(PixelGrid, Quantization)> {
    let mut grid = downsample(ctx.source, ctx.config.target_width)?;
    let mut q = quantize(&mut grid, ctx.config.color_count);

    for entry in ctx.palette {
        let Some(fresh) = q.palette.get(entry.index) else {
            continue;
        };
        if fresh.color() != entry.color() {
            recolor(
                &mut grid,
                &mut q.palette,
                &q.assignment,
                entry.index,
                entry.color(),
            )?;
        }
    }
    Ok((grid, q))
}

/// Compose the export image without encoding it.
pub fn compose(ctx: &ExportContext<'_>, options: &ExportOptions) -> Result<RgbaImage> {
    let (grid, q) = mosaic_state(ctx)?;
    let (src_w, src_h) = ctx.source.dimensions();
    let scale = effective_scale(options.scale, src_w, src_h);
    let flags = OverlayFlags {
        show_grid: options.include_grid,
        show_color_numbers: options.include_color_numbers,
    };
    let layout = RenderLayout::new(grid.width(), grid.height(), src_w, src_h, scale, flags);

    let palette_h = if options.include_palette {
        palette_panel_height(layout.mosaic_h)
    } else {
        0
    };
    let stats_h = if options.include_stats {
        stats_panel_height(layout.mosaic_h)
    } else {
        0
    };

    let theme = options.theme;
    let mut canvas = Canvas::new(
        layout.canvas_width(),
        layout.canvas_height() + palette_h + stats_h,
        theme.background(),
    )?;

    let style = OverlayStyle {
        axis_label: theme.foreground(),
        ..OverlayStyle::default()
    };
    render::draw_tiles(&mut canvas, &layout, &grid);
    render::draw_overlay(&mut canvas, &layout, flags, Some(&q.assignment), &style);

    let mut top = layout.canvas_height();
    if options.include_palette {
        draw_palette_panel(&mut canvas, &q.palette, top, palette_h, theme);
        top += palette_h;
    }
    if options.include_stats {
        let stats = MosaicStats::compute(ctx.config, src_w, src_h);
        draw_stats_panel(&mut canvas, &stats, top, stats_h, theme);
    }

    Ok(canvas.into_image())
}

/// Compose and PNG-encode the export template.
pub fn export(ctx: &ExportContext<'_>, options: &ExportOptions) -> Result<ExportArtifact> {
    let image = compose(ctx, options)?;
    let (width, height) = image.dimensions();
    let png = encode_png(image)?;
    tracing::info!(width, height, bytes = png.len(), "Exported mosaic template");
    Ok(ExportArtifact { png, width, height })
}

pub fn encode_png(image: RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| MosaicError::PngEncode(e.to_string()))?;
    Ok(buf)
}

#[derive(Clone, Copy, Debug)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

/// Draw a panel title and return the area left below it.
fn draw_panel_title(
    canvas: &mut Canvas,
    title: &str,
    top: u32,
    height: u32,
    color: Rgba<u8>,
) -> Rect {
    let width = canvas.width() as f32;
    let height = height as f32;
    let inset = (height * 0.06).max(2.0);

    let px = ((height * 0.12) / font::GLYPH_H as f32).floor().max(1.0) as u32;
    let px = font::fit_px(title, px, width - 2.0 * inset);
    let (_, title_h) = font::measure(title, px);
    canvas.draw_text(inset, top as f32 + inset, title, px, color);

    let y = top as f32 + 2.0 * inset + title_h as f32;
    Rect {
        x: inset,
        y,
        w: (width - 2.0 * inset).max(1.0),
        h: (top as f32 + height - inset - y).max(1.0),
    }
}

/// Fewest columns for which `count` cells in `area` are at least
/// [`SWATCH_ASPECT`] as tall as they are wide.
fn swatch_columns(count: usize, area: Rect) -> usize {
    (1..=count)
        .find(|&cols| {
            let rows = count.div_ceil(cols);
            let cell_w = area.w / cols as f32;
            let cell_h = area.h / rows as f32;
            cell_h >= SWATCH_ASPECT * cell_w
        })
        .unwrap_or(count)
        .max(1)
}

fn draw_centered(canvas: &mut Canvas, text: &str, cx: f32, cy: f32, px: u32, color: Rgba<u8>) {
    let (w, h) = font::measure(text, px);
    canvas.draw_text(cx - w as f32 / 2.0, cy - h as f32 / 2.0, text, px, color);
}

fn draw_palette_panel(
    canvas: &mut Canvas,
    palette: &[PaletteEntry],
    top: u32,
    height: u32,
    theme: Theme,
) {
    let text = theme.foreground();
    let area = draw_panel_title(canvas, "Color Palette", top, height, text);
    if palette.is_empty() {
        return;
    }

    let cols = swatch_columns(palette.len(), area);
    let rows = palette.len().div_ceil(cols);
    let cell_w = area.w / cols as f32;
    let cell_h = area.h / rows as f32;
    let gap = (cell_w.min(cell_h) * 0.06).max(1.0);

    for (i, entry) in palette.iter().enumerate() {
        let x = area.x + (i % cols) as f32 * cell_w + gap;
        let y = area.y + (i / cols) as f32 * cell_h + gap;
        let inner_w = cell_w - 2.0 * gap;
        let inner_h = cell_h - 2.0 * gap;
        let swatch_h = inner_h * 0.6;

        let color = entry.color();
        let fill = Rgba([color.red, color.green, color.blue, 255]);
        canvas.fill_rect(x, y, x + inner_w, y + swatch_h, fill);

        let label = (entry.index + 1).to_string();
        let label_px = ((swatch_h * 0.5) / font::GLYPH_H as f32).floor().max(1.0) as u32;
        let label_px = font::fit_px(&label, label_px, inner_w);
        let ink = if luminance(color) > 140.0 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        };
        draw_centered(canvas, &label, x + inner_w / 2.0, y + swatch_h / 2.0, label_px, ink);

        // Hex and tile count share the space under the swatch.
        let line_h = (inner_h - swatch_h) / 2.0;
        let tiles = format!("{} tiles", entry.tile_count);
        let line_px = ((line_h * 0.7) / font::GLYPH_H as f32).floor().max(1.0) as u32;
        let line_px = font::fit_px(&entry.hex, line_px, inner_w)
            .min(font::fit_px(&tiles, line_px, inner_w));
        let cx = x + inner_w / 2.0;
        draw_centered(canvas, &entry.hex, cx, y + swatch_h + line_h / 2.0, line_px, text);
        draw_centered(canvas, &tiles, cx, y + swatch_h + line_h * 1.5, line_px, text);
    }
}

fn draw_stats_panel(canvas: &mut Canvas, stats: &MosaicStats, top: u32, height: u32, theme: Theme) {
    let text = theme.foreground();
    let area = draw_panel_title(canvas, "Mosaic Statistics", top, height, text);

    let header = stats.header();
    let rows = stats.rows();
    let table: Vec<&[String; 4]> = std::iter::once(&header).chain(rows.iter()).collect();

    let row_h = area.h / table.len() as f32;
    let col_w = area.w / 4.0;
    let pad = (col_w * 0.04).max(1.0);

    let mut px = ((row_h * 0.6) / font::GLYPH_H as f32).floor().max(1.0) as u32;
    for row in &table {
        for cell in row.iter() {
            px = px.min(font::fit_px(cell, px, col_w - 2.0 * pad));
        }
    }
    let (_, text_h) = font::measure("0", px);

    for (r, row) in table.iter().enumerate() {
        let y = area.y + r as f32 * row_h + (row_h - text_h as f32) / 2.0;
        for (c, cell) in row.iter().enumerate() {
            canvas.draw_text(area.x + c as f32 * col_w + pad, y, cell, px, text);
        }
    }

    // Rule under the header row.
    let rule = (row_h / 20.0).max(1.0);
    let [r, g, b, _] = text.0;
    canvas.fill_rect(
        area.x,
        area.y + row_h - rule,
        area.x + area.w,
        area.y + row_h,
        Rgba([r, g, b, 128]),
    );
}
