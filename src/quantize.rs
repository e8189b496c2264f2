//! Deterministic k-means color quantization in RGB space.
//!
//! Centroids are seeded from the first `k` opaque pixels in row-major order
//! and refined for a fixed number of iterations. Seeding is reproducible but
//! naive (no k-means++, no restarts): repeated leading colors give duplicate
//! seeds, and some of those clusters may stay empty. The resulting palette is
//! numbered by each cluster's first occurrence in the image.

use palette::Srgb;

use crate::colors::PaletteEntry;
use crate::downsample::PixelGrid;

pub const KMEANS_ITERATIONS: usize = 10;

/// Palette index per opaque pixel, keyed by linear position `row * width + col`.
///
/// Transparent pixels have no entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterAssignment {
    width: u32,
    height: u32,
    /// Ascending linear positions of the opaque pixels.
    positions: Vec<usize>,
    /// Palette index for `positions[i]`.
    indices: Vec<usize>,
}

impl ClusterAssignment {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of opaque pixels.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Palette index at a linear pixel position.
    pub fn get(&self, position: usize) -> Option<usize> {
        self.positions
            .binary_search(&position)
            .ok()
            .map(|i| self.indices[i])
    }

    /// Palette index of the tile at `(col, row)`.
    pub fn tile(&self, col: u32, row: u32) -> Option<usize> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.get(row as usize * self.width as usize + col as usize)
    }

    /// `(position, palette index)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.positions.iter().copied().zip(self.indices.iter().copied())
    }

    /// Linear positions assigned to palette entry `index`.
    pub fn positions_of(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.iter()
            .filter(move |&(_, i)| i == index)
            .map(|(position, _)| position)
    }
}

/// Palette and assignment produced together by one quantization run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Quantization {
    pub palette: Vec<PaletteEntry>,
    pub assignment: ClusterAssignment,
}

type Rgb = [i32; 3];

#[inline(always)]
fn distance_sq(a: &Rgb, b: &Rgb) -> i32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

/// Index of the closest centroid; ties keep the lowest index.
fn nearest(pixel: &Rgb, centroids: &[Rgb]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = i32::MAX;
    for (idx, c) in centroids.iter().enumerate() {
        let dist = distance_sq(pixel, c);
        if dist < best_dist {
            best_dist = dist;
            best_idx = idx;
        }
    }
    best_idx
}

/// Rounded mean, halves rounding up (all inputs are non-negative).
#[inline]
fn rounded_mean(sum: i64, count: i64) -> i32 {
    ((2 * sum + count) / (2 * count)) as i32
}

/// The first `k` opaque pixels in scan order, repeats included.
fn seed_centroids(pixels: &[Rgb], k: usize) -> Vec<Rgb> {
    pixels[..k].to_vec()
}

/// Cluster indices ordered by first appearance in `labels`; clusters that
/// never appear follow in their original order.
fn first_appearance_order(labels: &[usize], k: usize) -> Vec<usize> {
    let mut seen = vec![false; k];
    let mut order = Vec::with_capacity(k);
    for &label in labels {
        if !seen[label] {
            seen[label] = true;
            order.push(label);
        }
    }
    order.extend((0..k).filter(|&i| !seen[i]));
    order
}

fn assign(pixels: &[Rgb], centroids: &[Rgb], out: &mut [usize]) {
    for (slot, pixel) in out.iter_mut().zip(pixels) {
        *slot = nearest(pixel, centroids);
    }
}

fn update(pixels: &[Rgb], labels: &[usize], centroids: &mut [Rgb]) {
    let mut sums = vec![[0i64; 3]; centroids.len()];
    let mut counts = vec![0i64; centroids.len()];
    for (pixel, &label) in pixels.iter().zip(labels) {
        for c in 0..3 {
            sums[label][c] += pixel[c] as i64;
        }
        counts[label] += 1;
    }
    for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
        // Empty clusters keep their previous centroid.
        if count > 0 {
            *centroid = [
                rounded_mean(sum[0], count),
                rounded_mean(sum[1], count),
                rounded_mean(sum[2], count),
            ];
        }
    }
}

/// Quantize the opaque pixels of `grid` to at most `color_count` colors.
///
/// Every opaque pixel's RGB is overwritten with its centroid (alpha kept);
/// transparent pixels are left untouched. With no opaque pixels the palette
/// is empty and the grid is unchanged.
pub fn quantize(grid: &mut PixelGrid, color_count: usize) -> Quantization {
    let (width, height) = grid.dimensions();

    let mut positions = Vec::new();
    let mut pixels: Vec<Rgb> = Vec::new();
    for (i, chunk) in grid.as_raw().chunks_exact(4).enumerate() {
        if chunk[3] > 0 {
            positions.push(i);
            pixels.push([chunk[0] as i32, chunk[1] as i32, chunk[2] as i32]);
        }
    }

    if pixels.is_empty() {
        return Quantization {
            palette: Vec::new(),
            assignment: ClusterAssignment {
                width,
                height,
                ..ClusterAssignment::default()
            },
        };
    }

    let k = color_count.max(1).min(pixels.len());
    let mut centroids = seed_centroids(&pixels, k);
    let mut labels = vec![0usize; pixels.len()];

    for _ in 0..KMEANS_ITERATIONS {
        assign(&pixels, &centroids, &mut labels);
        update(&pixels, &labels, &mut centroids);
    }
    assign(&pixels, &centroids, &mut labels);

    // Number the palette by first occurrence in the image.
    let order = first_appearance_order(&labels, k);
    let mut renumber = vec![0usize; k];
    for (new, &old) in order.iter().enumerate() {
        renumber[old] = new;
    }
    let centroids: Vec<Rgb> = order.iter().map(|&old| centroids[old]).collect();
    for label in labels.iter_mut() {
        *label = renumber[*label];
    }

    let mut counts = vec![0usize; k];
    for &label in &labels {
        counts[label] += 1;
    }

    let colors: Vec<Srgb<u8>> = centroids
        .iter()
        .map(|c| Srgb::new(c[0] as u8, c[1] as u8, c[2] as u8))
        .collect();

    let raw: &mut [u8] = &mut **grid;
    for (&position, &label) in positions.iter().zip(&labels) {
        let c = colors[label];
        let idx = position * 4;
        raw[idx] = c.red;
        raw[idx + 1] = c.green;
        raw[idx + 2] = c.blue;
    }

    let palette: Vec<PaletteEntry> = colors
        .iter()
        .zip(&counts)
        .enumerate()
        .map(|(index, (&color, &count))| PaletteEntry::new(index, color, count))
        .collect();

    tracing::debug!(
        opaque = pixels.len(),
        requested = color_count,
        colors = palette.len(),
        "Quantized pixel grid"
    );

    Quantization {
        palette,
        assignment: ClusterAssignment {
            width,
            height,
            positions,
            indices: labels,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    fn grid_from(width: u32, pixels: &[[u8; 4]]) -> PixelGrid {
        let height = pixels.len() as u32 / width;
        let raw: Vec<u8> = pixels.iter().flatten().copied().collect();
        RgbaImage::from_raw(width, height, raw).unwrap()
    }

    fn gradient(width: u32, height: u32) -> PixelGrid {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                ((x * 7 + y * 13) % 256) as u8,
                255,
            ])
        })
    }

    #[test]
    fn test_two_color_scenario() {
        let mut grid = grid_from(
            2,
            &[
                [255, 0, 0, 255],
                [255, 0, 0, 255],
                [0, 0, 255, 255],
                [0, 0, 255, 255],
            ],
        );
        let q = quantize(&mut grid, 2);

        assert_eq!(
            q.palette,
            vec![
                PaletteEntry::new(0, Srgb::new(255, 0, 0), 2),
                PaletteEntry::new(1, Srgb::new(0, 0, 255), 2),
            ]
        );
        assert_eq!(
            q.assignment.iter().collect::<Vec<_>>(),
            vec![(0, 0), (1, 0), (2, 1), (3, 1)]
        );
        assert_eq!(q.palette[0].hex, "#ff0000");
    }

    #[test]
    fn test_palette_length_is_min_k_n() {
        for k in [1, 2, 5, 16, 256] {
            let mut grid = gradient(4, 3);
            let q = quantize(&mut grid, k);
            assert_eq!(q.palette.len(), k.min(12), "k = {k}");
        }
    }

    #[test]
    fn test_counts_sum_to_opaque_pixels() {
        let mut grid = gradient(9, 7);
        grid.put_pixel(3, 3, Rgba([0, 0, 0, 0]));
        grid.put_pixel(4, 3, Rgba([50, 50, 50, 0]));
        let q = quantize(&mut grid, 5);

        let total: usize = q.palette.iter().map(|e| e.tile_count).sum();
        assert_eq!(total, 61);
        assert_eq!(q.assignment.len(), 61);
        assert!(q.assignment.iter().all(|(_, i)| i < q.palette.len()));
    }

    #[test]
    fn test_transparent_pixels_untouched() {
        let mut grid = grid_from(
            3,
            &[[10, 20, 30, 255], [77, 88, 99, 0], [200, 210, 220, 128]],
        );
        let q = quantize(&mut grid, 1);

        assert_eq!(grid.get_pixel(1, 0).0, [77, 88, 99, 0]);
        assert_eq!(q.assignment.get(1), None);
        // Single centroid = rounded mean of the two opaque pixels, alpha kept.
        assert_eq!(grid.get_pixel(0, 0).0, [105, 115, 125, 255]);
        assert_eq!(grid.get_pixel(2, 0).0, [105, 115, 125, 128]);
    }

    #[test]
    fn test_all_transparent_gives_empty_palette() {
        let mut grid = RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 0]));
        let before = grid.clone();
        let q = quantize(&mut grid, 4);
        assert!(q.palette.is_empty());
        assert!(q.assignment.is_empty());
        assert_eq!(grid, before);
    }

    #[test]
    fn test_deterministic() {
        let mut a = gradient(16, 12);
        let mut b = gradient(16, 12);
        let qa = quantize(&mut a, 6);
        let qb = quantize(&mut b, 6);
        assert_eq!(qa, qb);
        assert_eq!(a, b);
    }

    #[test]
    fn test_seeds_are_leading_pixels_verbatim() {
        // A white top row seeds every centroid with white; the colored row
        // collapses into one grey cluster and the third seed stays empty.
        let mut grid = grid_from(
            3,
            &[
                [255, 255, 255, 255],
                [255, 255, 255, 255],
                [255, 255, 255, 255],
                [255, 0, 0, 255],
                [0, 255, 0, 255],
                [0, 0, 255, 255],
            ],
        );
        let q = quantize(&mut grid, 3);
        let summary: Vec<(Srgb<u8>, usize)> =
            q.palette.iter().map(|e| (e.color(), e.tile_count)).collect();
        assert_eq!(
            summary,
            vec![
                (Srgb::new(255, 255, 255), 3),
                (Srgb::new(85, 85, 85), 3),
                (Srgb::new(255, 255, 255), 0),
            ]
        );
        assert_eq!(grid.get_pixel(0, 1).0, [85, 85, 85, 255]);
    }

    #[test]
    fn test_palette_numbered_by_first_occurrence() {
        assert_eq!(first_appearance_order(&[1, 1, 0, 2], 3), vec![1, 0, 2]);
        assert_eq!(first_appearance_order(&[2, 0], 4), vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_single_color_image_keeps_requested_palette_length() {
        let mut grid = RgbaImage::from_pixel(2, 2, Rgba([40, 40, 40, 255]));
        let q = quantize(&mut grid, 3);
        assert_eq!(q.palette.len(), 3);
        assert_eq!(
            q.palette.iter().map(|e| e.tile_count).collect::<Vec<_>>(),
            vec![4, 0, 0]
        );
        assert!(q.palette.iter().all(|e| e.hex == "#282828"));
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        // 100 is equidistant from 90 and 110.
        let mut grid = grid_from(
            3,
            &[[90, 0, 0, 255], [110, 0, 0, 255], [100, 0, 0, 255]],
        );
        let q = quantize(&mut grid, 2);
        assert_eq!(q.assignment.get(2), Some(0));
    }

    #[test]
    fn test_rounded_mean_rounds_half_up() {
        assert_eq!(rounded_mean(3, 2), 2);
        assert_eq!(rounded_mean(5, 4), 1);
        assert_eq!(rounded_mean(255 * 3, 3), 255);
    }

    #[test]
    fn test_tile_lookup() {
        let mut grid = gradient(5, 4);
        let q = quantize(&mut grid, 3);
        assert_eq!(q.assignment.tile(2, 3), q.assignment.get(17));
        assert_eq!(q.assignment.tile(5, 0), None);
    }
}
