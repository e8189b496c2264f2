use palette::Srgb;

use crate::colors::PaletteEntry;
use crate::downsample::PixelGrid;
use crate::error::{MosaicError, Result};
use crate::quantize::ClusterAssignment;

/// Change palette entry `index` to `color` and repaint its tiles.
///
/// Only pixels assigned to `index` are touched (alpha kept). Tile counts,
/// the assignment and every other entry stay as they are. Returns the number
/// of repainted pixels.
pub fn recolor(
    grid: &mut PixelGrid,
    palette: &mut [PaletteEntry],
    assignment: &ClusterAssignment,
    index: usize,
    color: Srgb<u8>,
) -> Result<usize> {
    let len = palette.len();
    let entry = palette
        .get_mut(index)
        .ok_or(MosaicError::PaletteIndex { index, len })?;
    entry.set_color(color);

    let raw: &mut [u8] = &mut **grid;
    let mut repainted = 0;
    for position in assignment.positions_of(index) {
        let idx = position * 4;
        raw[idx] = color.red;
        raw[idx + 1] = color.green;
        raw[idx + 2] = color.blue;
        repainted += 1;
    }
    Ok(repainted)
}
