//! Minimal RGBA raster surface: alpha-blended rectangles and bitmap text.

use image::{Rgba, RgbaImage};

use crate::error::{MosaicError, Result};
use crate::font;

/// Refuse surfaces above this many pixels rather than abort on allocation.
pub(crate) const MAX_SURFACE_PIXELS: u64 = 1 << 28;

pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// A `width × height` surface filled with `background`.
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Result<Self> {
        let pixels = width as u64 * height as u64;
        if width == 0 || height == 0 || pixels > MAX_SURFACE_PIXELS {
            return Err(MosaicError::SurfaceAllocation { width, height });
        }
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, background),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Source-over blend of `color` onto the pixel at `(x, y)`; out of bounds is ignored.
    #[inline]
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        *dst = blend(*dst, color);
    }

    /// Fill the pixel-snapped rectangle `[x0, x1) × [y0, y1)`.
    pub fn fill_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba<u8>) {
        let (x0, x1) = snap(x0, x1);
        let (y0, y1) = snap(y0, y1);
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.width() as i64);
        let y1 = y1.min(self.height() as i64);
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// Draw `text` left-to-right with its top-left corner at `(x, y)`.
    pub fn draw_text(&mut self, x: f32, y: f32, text: &str, px: u32, color: Rgba<u8>) {
        let ox = x.round() as i64;
        let oy = y.round() as i64;
        let p = px as i64;
        font::for_each_pixel(text, |gx, gy| {
            let bx = ox + gx as i64 * p;
            let by = oy + gy as i64 * p;
            self.fill_block(bx, by, p, color);
        });
    }

    /// Draw `text` rotated 90° counter-clockwise, reading bottom-to-top.
    ///
    /// `(x, y)` is the bottom-left corner of the rotated text box, so the
    /// text occupies `[x, x + height) × [y - width, y)`.
    pub fn draw_text_rotated(&mut self, x: f32, y: f32, text: &str, px: u32, color: Rgba<u8>) {
        let ox = x.round() as i64;
        let oy = y.round() as i64;
        let p = px as i64;
        font::for_each_pixel(text, |gx, gy| {
            let bx = ox + gy as i64 * p;
            let by = oy - (gx as i64 + 1) * p;
            self.fill_block(bx, by, p, color);
        });
    }

    fn fill_block(&mut self, x: i64, y: i64, size: i64, color: Rgba<u8>) {
        for dy in 0..size {
            for dx in 0..size {
                self.blend_pixel(x + dx, y + dy, color);
            }
        }
    }
}

/// Round both edges, keeping at least one pixel for non-empty spans.
fn snap(a: f32, b: f32) -> (i64, i64) {
    let lo = a.round() as i64;
    let hi = b.round() as i64;
    if b > a && hi <= lo {
        (lo, lo + 1)
    } else {
        (lo, hi)
    }
}

/// Straight-alpha source-over.
pub fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src.0[3] as f32 / 255.0;
    if sa >= 1.0 {
        return src;
    }
    if sa <= 0.0 {
        return dst;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src.0[c] as f32 * sa + dst.0[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}
