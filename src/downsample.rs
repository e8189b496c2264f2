//! Source → working tile grid reduction.

use image::RgbaImage;

use crate::canvas::MAX_SURFACE_PIXELS;
use crate::error::{MosaicError, Result};
use crate::source::SourceImage;

/// The working low-resolution RGBA buffer, one pixel per tile.
pub type PixelGrid = RgbaImage;

/// Grid height for `target_width` tiles, keeping the source aspect ratio (at least 1).
pub fn target_height(target_width: u32, source_width: u32, source_height: u32) -> u32 {
    let h = (target_width as f64 * source_height as f64 / source_width as f64).round();
    (h as u32).max(1)
}

/// Reduce `source` to a `target_width × target_height` [`PixelGrid`].
pub fn downsample(source: &SourceImage, target_width: u32) -> Result<PixelGrid> {
    let (in_w, in_h) = source.dimensions();
    if in_w == 0 || in_h == 0 {
        return Err(MosaicError::InvalidImage {
            width: in_w,
            height: in_h,
        });
    }
    let out_w = target_width.max(1);
    let out_h = target_height(out_w, in_w, in_h);
    if out_w as u64 * out_h as u64 > MAX_SURFACE_PIXELS {
        return Err(MosaicError::SurfaceAllocation {
            width: out_w,
            height: out_h,
        });
    }
    area_resample(source.pixels(), out_w, out_h)
}

/// Source pixels overlapping each output pixel along one axis, with their
/// share of the output pixel's footprint (shares sum to 1).
fn coverage(in_len: u32, out_len: u32) -> Vec<Vec<(usize, f32)>> {
    let scale = in_len as f64 / out_len as f64;
    (0..out_len)
        .map(|o| {
            let start = o as f64 * scale;
            let end = (o as f64 + 1.0) * scale;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(in_len);
            (first..last)
                .filter_map(|i| {
                    let overlap = end.min(i as f64 + 1.0) - start.max(i as f64);
                    (overlap > 0.0).then(|| (i as usize, (overlap / scale) as f32))
                })
                .collect()
        })
        .collect()
}

/// Box-filter area resampling, separable: vertical pass then horizontal pass.
///
/// Colour is averaged premultiplied by alpha so transparent pixels do not
/// darken the edges of opaque regions.
fn area_resample(img: &RgbaImage, out_w: u32, out_h: u32) -> Result<PixelGrid> {
    let (in_w, in_h) = img.dimensions();

    // Fast path – no scaling required.
    if out_w == in_w && out_h == in_h {
        return Ok(img.clone());
    }

    let raw = img.as_raw();

    // --------------------------------------------------------
    // First pass: vertical reduction (in_w × out_h)
    // --------------------------------------------------------
    let rows = coverage(in_h, out_h);
    let mut vertical = vec![[0f32; 4]; (in_w * out_h) as usize];
    for (y_out, span) in rows.iter().enumerate() {
        for x in 0..in_w as usize {
            let mut acc = [0f32; 4];
            for &(y, weight) in span {
                let idx = (y * in_w as usize + x) * 4;
                let a = raw[idx + 3] as f32 / 255.0;
                acc[0] += raw[idx] as f32 * a * weight;
                acc[1] += raw[idx + 1] as f32 * a * weight;
                acc[2] += raw[idx + 2] as f32 * a * weight;
                acc[3] += a * weight;
            }
            vertical[y_out * in_w as usize + x] = acc;
        }
    }

    // --------------------------------------------------------
    // Second pass: horizontal reduction (out_w × out_h)
    // --------------------------------------------------------
    let cols = coverage(in_w, out_w);
    let mut out_buf = vec![0u8; (out_w * out_h * 4) as usize];
    for y_out in 0..out_h as usize {
        for (x_out, span) in cols.iter().enumerate() {
            let mut acc = [0f32; 4];
            for &(x, weight) in span {
                let pix = vertical[y_out * in_w as usize + x];
                for c in 0..4 {
                    acc[c] += pix[c] * weight;
                }
            }

            let idx = (y_out * out_w as usize + x_out) * 4;
            let alpha = acc[3];
            if alpha <= f32::EPSILON {
                continue;
            }
            for c in 0..3 {
                out_buf[idx + c] = (acc[c] / alpha).round().clamp(0.0, 255.0) as u8;
            }
            out_buf[idx + 3] = (alpha * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }

    RgbaImage::from_raw(out_w, out_h, out_buf).ok_or(MosaicError::SurfaceAllocation {
        width: out_w,
        height: out_h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn source(img: RgbaImage) -> SourceImage {
        SourceImage::from_rgba(img).unwrap()
    }

    #[test]
    fn test_target_height_keeps_aspect() {
        assert_eq!(target_height(32, 1920, 1080), 18);
        assert_eq!(target_height(10, 100, 100), 10);
        assert_eq!(target_height(2, 1000, 10), 1);
    }

    #[test]
    fn test_same_size_is_identity() {
        let img = RgbaImage::from_fn(4, 3, |x, y| Rgba([x as u8 * 40, y as u8 * 60, 7, 255]));
        let grid = downsample(&source(img.clone()), 4).unwrap();
        assert_eq!(grid, img);
    }

    #[test]
    fn test_halving_averages_blocks() {
        // Left half red, right half blue, 4x2 -> 2x1.
        let img = RgbaImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let grid = downsample(&source(img), 2).unwrap();
        assert_eq!(grid.dimensions(), (2, 1));
        assert_eq!(grid.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(grid.get_pixel(1, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_mixed_block_is_mean() {
        let img = RgbaImage::from_fn(2, 2, |x, _| {
            if x == 0 {
                Rgba([200, 100, 0, 255])
            } else {
                Rgba([100, 50, 0, 255])
            }
        });
        let grid = downsample(&source(img), 1).unwrap();
        assert_eq!(grid.get_pixel(0, 0).0, [150, 75, 0, 255]);
    }

    #[test]
    fn test_transparent_pixels_do_not_darken() {
        let img = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([0, 200, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        let grid = downsample(&source(img), 1).unwrap();
        let px = grid.get_pixel(0, 0).0;
        assert_eq!(&px[..3], &[0, 200, 0]);
        assert_eq!(px[3], 128);
    }

    #[test]
    fn test_fully_transparent_stays_transparent() {
        let img = RgbaImage::new(6, 6);
        let grid = downsample(&source(img), 3).unwrap();
        assert!(grid.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_upscaling_widths_are_allowed() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([9, 9, 9, 255]));
        let grid = downsample(&source(img), 5).unwrap();
        assert_eq!(grid.dimensions(), (5, 3));
        assert!(grid.pixels().all(|p| p.0 == [9, 9, 9, 255]));
    }

    #[test]
    fn test_oversized_grid_is_refused() {
        // 100000 tiles wide on a 1:10 source is a million rows.
        let img = RgbaImage::from_pixel(2, 20, Rgba([1, 1, 1, 255]));
        assert!(matches!(
            downsample(&source(img), 100_000),
            Err(MosaicError::SurfaceAllocation {
                width: 100_000,
                height: 1_000_000
            })
        ));
    }

    #[test]
    fn test_zero_width_request_clamps_to_one() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([1, 1, 1, 255]));
        let grid = downsample(&source(img), 0).unwrap();
        assert_eq!(grid.dimensions(), (1, 1));
    }
}
