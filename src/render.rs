//! Mosaic tiles, grid lines, axis indices and per-tile palette labels.
//!
//! Every size is derived from the layout's integer `scale`, so the 1× preview
//! and the 8× export look the same apart from resolution.

use image::{Rgba, RgbaImage};

use crate::canvas::Canvas;
use crate::downsample::PixelGrid;
use crate::error::Result;
use crate::font;
use crate::quantize::ClusterAssignment;

/// Margin reserved on every side for axis labels and edge tile labels, at 1×.
pub const BASE_PADDING: u32 = 20;
const AXIS_FONT_MIN: f32 = 6.0;
const AXIS_FONT_MAX: f32 = 10.0;
const NUMBER_FONT_MAX: f32 = 12.0;
/// Distance between axis labels and the grid, and badge margin, at 1×.
const LABEL_GAP: f32 = 2.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverlayFlags {
    pub show_grid: bool,
    pub show_color_numbers: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayStyle {
    pub line: Rgba<u8>,
    pub axis_label: Rgba<u8>,
    pub badge: Rgba<u8>,
    pub badge_text: Rgba<u8>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            line: Rgba([0, 0, 0, 128]),
            axis_label: Rgba([0, 0, 0, 255]),
            badge: Rgba([255, 255, 255, 179]),
            badge_text: Rgba([0, 0, 0, 255]),
        }
    }
}

/// Geometry of one rendering: tile grid, drawn mosaic size and padding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderLayout {
    pub tiles_w: u32,
    pub tiles_h: u32,
    pub scale: u32,
    pub padding: u32,
    /// Drawn mosaic size in pixels, excluding padding.
    pub mosaic_w: u32,
    pub mosaic_h: u32,
}

impl RenderLayout {
    /// Layout for a `tiles_w × tiles_h` grid drawn over a `base_w × base_h`
    /// area (the source image size) at `scale`.
    pub fn new(
        tiles_w: u32,
        tiles_h: u32,
        base_w: u32,
        base_h: u32,
        scale: u32,
        flags: OverlayFlags,
    ) -> Self {
        let scale = scale.max(1);
        Self {
            tiles_w: tiles_w.max(1),
            tiles_h: tiles_h.max(1),
            scale,
            padding: if flags.show_grid || flags.show_color_numbers {
                BASE_PADDING * scale
            } else {
                0
            },
            mosaic_w: base_w.max(1) * scale,
            mosaic_h: base_h.max(1) * scale,
        }
    }

    pub fn canvas_width(&self) -> u32 {
        self.mosaic_w + 2 * self.padding
    }

    pub fn canvas_height(&self) -> u32 {
        self.mosaic_h + 2 * self.padding
    }

    pub fn cell_width(&self) -> f32 {
        self.mosaic_w as f32 / self.tiles_w as f32
    }

    pub fn cell_height(&self) -> f32 {
        self.mosaic_h as f32 / self.tiles_h as f32
    }

    fn cell_x(&self, col: u32) -> f32 {
        self.padding as f32 + col as f32 * self.cell_width()
    }

    fn cell_y(&self, row: u32) -> f32 {
        self.padding as f32 + row as f32 * self.cell_height()
    }

    pub fn line_width(&self) -> f32 {
        (self.scale as f32 / 4.0).max(1.0)
    }

    fn gap(&self) -> f32 {
        LABEL_GAP * self.scale as f32
    }

    /// Glyph pixel size for axis indices: bounded by tile size, then shrunk
    /// until the widest index fits in the padding.
    pub fn axis_px(&self) -> u32 {
        let s = self.scale as f32;
        let cell = self.cell_width().min(self.cell_height());
        let size = (cell / 3.0)
            .floor()
            .clamp(AXIS_FONT_MIN * s, AXIS_FONT_MAX * s);
        let px = ((size / font::GLYPH_H as f32).round() as u32).max(1);
        let widest = self.tiles_w.max(self.tiles_h).to_string();
        let room = self.padding as f32 - 2.0 * self.gap();
        font::fit_px(&widest, px, room)
    }

    /// Glyph pixel size for the per-tile palette labels.
    pub fn number_px(&self) -> u32 {
        let size = (self.cell_width() * 0.5)
            .min(self.cell_height() * 0.5)
            .min(NUMBER_FONT_MAX * self.scale as f32);
        ((size / font::GLYPH_H as f32).floor() as u32).max(1)
    }
}

/// Fill every tile's cell with its pixel color (nearest neighbour).
pub fn draw_tiles(canvas: &mut Canvas, layout: &RenderLayout, grid: &PixelGrid) {
    for (col, row, pixel) in grid.enumerate_pixels() {
        if pixel.0[3] == 0 {
            continue;
        }
        canvas.fill_rect(
            layout.cell_x(col),
            layout.cell_y(row),
            layout.cell_x(col + 1),
            layout.cell_y(row + 1),
            *pixel,
        );
    }
}

/// Grid lines, 1-based axis indices and per-tile palette labels.
pub fn draw_overlay(
    canvas: &mut Canvas,
    layout: &RenderLayout,
    flags: OverlayFlags,
    assignment: Option<&ClusterAssignment>,
    style: &OverlayStyle,
) {
    if flags.show_grid {
        draw_grid_lines(canvas, layout, style);
        draw_axis_labels(canvas, layout, style);
    }
    if flags.show_color_numbers {
        if let Some(assignment) = assignment {
            draw_tile_numbers(canvas, layout, assignment, style);
        }
    }
}

fn draw_grid_lines(canvas: &mut Canvas, layout: &RenderLayout, style: &OverlayStyle) {
    let half = layout.line_width() / 2.0;
    let top = layout.padding as f32;
    let left = layout.padding as f32;
    let bottom = top + layout.mosaic_h as f32;
    let right = left + layout.mosaic_w as f32;

    for col in 0..=layout.tiles_w {
        let x = layout.cell_x(col);
        canvas.fill_rect(x - half, top, x + half, bottom, style.line);
    }
    for row in 0..=layout.tiles_h {
        let y = layout.cell_y(row);
        canvas.fill_rect(left, y - half, right, y + half, style.line);
    }
}

fn draw_axis_labels(canvas: &mut Canvas, layout: &RenderLayout, style: &OverlayStyle) {
    let px = layout.axis_px();
    let edge = layout.padding as f32 - layout.gap();

    // Column indices above the grid, rotated to read bottom-to-top.
    for col in 0..layout.tiles_w {
        let text = (col + 1).to_string();
        let (_, text_h) = font::measure(&text, px);
        let cx = layout.cell_x(col) + layout.cell_width() / 2.0;
        canvas.draw_text_rotated(cx - text_h as f32 / 2.0, edge, &text, px, style.axis_label);
    }

    // Row indices left of the grid, right-aligned.
    for row in 0..layout.tiles_h {
        let text = (row + 1).to_string();
        let (text_w, text_h) = font::measure(&text, px);
        let cy = layout.cell_y(row) + layout.cell_height() / 2.0;
        canvas.draw_text(
            edge - text_w as f32,
            cy - text_h as f32 / 2.0,
            &text,
            px,
            style.axis_label,
        );
    }
}

fn draw_tile_numbers(
    canvas: &mut Canvas,
    layout: &RenderLayout,
    assignment: &ClusterAssignment,
    style: &OverlayStyle,
) {
    let px = layout.number_px();
    let margin = layout.gap();
    for row in 0..layout.tiles_h {
        for col in 0..layout.tiles_w {
            let Some(index) = assignment.tile(col, row) else {
                continue;
            };
            let text = (index + 1).to_string();
            let (w, h) = font::measure(&text, px);
            let (w, h) = (w as f32, h as f32);
            let cx = layout.cell_x(col) + layout.cell_width() / 2.0;
            let cy = layout.cell_y(row) + layout.cell_height() / 2.0;

            canvas.fill_rect(
                cx - w / 2.0 - margin,
                cy - h / 2.0 - margin,
                cx + w / 2.0 + margin,
                cy + h / 2.0 + margin,
                style.badge,
            );
            canvas.draw_text(cx - w / 2.0, cy - h / 2.0, &text, px, style.badge_text);
        }
    }
}

/// Render `grid` with its overlay onto a fresh surface filled with `background`.
pub fn render_mosaic(
    grid: &PixelGrid,
    assignment: Option<&ClusterAssignment>,
    layout: &RenderLayout,
    flags: OverlayFlags,
    style: &OverlayStyle,
    background: Rgba<u8>,
) -> Result<RgbaImage> {
    let mut canvas = Canvas::new(layout.canvas_width(), layout.canvas_height(), background)?;
    draw_tiles(&mut canvas, layout, grid);
    draw_overlay(&mut canvas, layout, flags, assignment, style);
    Ok(canvas.into_image())
}
