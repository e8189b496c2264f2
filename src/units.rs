//! Physical size conversion and tile costing.
//!
//! Lengths are normalised to millimetres and areas to square millimetres.
//! Unit names are the strings the host UI offers (`mm`, `cm`, `m`, `inch`);
//! any other string is treated as millimetres on input and returned
//! unconverted on output.

const MM_PER_CM: f64 = 10.0;
const MM_PER_M: f64 = 1000.0;
const MM_PER_INCH: f64 = 25.4;

const MM2_PER_CM2: f64 = 100.0;
const MM2_PER_M2: f64 = 1_000_000.0;
const MM2_PER_INCH2: f64 = 645.16;

/// Millimetres per one `unit`, or `None` for unknown units.
fn length_factor(unit: &str) -> Option<f64> {
    match unit {
        "mm" => Some(1.0),
        "cm" => Some(MM_PER_CM),
        "m" => Some(MM_PER_M),
        "inch" => Some(MM_PER_INCH),
        _ => None,
    }
}

fn area_factor(unit: &str) -> Option<f64> {
    match unit {
        "mm" => Some(1.0),
        "cm" => Some(MM2_PER_CM2),
        "m" => Some(MM2_PER_M2),
        "inch" => Some(MM2_PER_INCH2),
        _ => None,
    }
}

/// Convert a length between units.
pub fn convert_size(value: f64, from: &str, to: &str) -> f64 {
    let mm = value * length_factor(from).unwrap_or(1.0);
    mm / length_factor(to).unwrap_or(1.0)
}

/// Convert an area between units; `from`/`to` name the length unit (`cm` means cm²).
pub fn convert_area(value: f64, from: &str, to: &str) -> f64 {
    let mm2 = value * area_factor(from).unwrap_or(1.0);
    mm2 / area_factor(to).unwrap_or(1.0)
}

/// Format a length in `to` with that unit's display precision.
pub fn format_size(value: f64, from: &str, to: &str) -> String {
    let converted = convert_size(value, from, to);
    match to {
        "mm" => format!("{converted:.1} mm"),
        "cm" => format!("{converted:.1} cm"),
        "m" => format!("{converted:.2} m"),
        "inch" => format!("{converted:.1} in"),
        other => format!("{converted:.1} {other}"),
    }
}

/// Format an area in `to`² with that unit's display precision.
pub fn format_area(value: f64, from: &str, to: &str) -> String {
    let converted = convert_area(value, from, to);
    match to {
        "mm" => format!("{converted:.0} mm²"),
        "cm" => format!("{converted:.1} cm²"),
        "m" => format!("{converted:.2} m²"),
        "inch" => format!("{converted:.1} in²"),
        other => format!("{converted:.1} {other}²"),
    }
}

pub fn format_cost(value: f64, currency: &str) -> String {
    format!("{currency}{value:.2}")
}

/// Tile rows for a mosaic `target_width` tiles wide, keeping the source aspect ratio.
///
/// Unlike the working grid height this is not clamped to 1, so a very wide
/// source reports zero rows in the statistics.
pub fn tile_height(target_width: u32, source_width: u32, source_height: u32) -> u32 {
    if source_width == 0 {
        return 0;
    }
    (target_width as f64 * source_height as f64 / source_width as f64).round() as u32
}

pub fn total_tiles(target_width: u32, source_width: u32, source_height: u32) -> u64 {
    target_width as u64 * tile_height(target_width, source_width, source_height) as u64
}

/// `total_tiles * (tile_cost / tile_cost_per)`.
pub fn tiles_cost(total_tiles: u64, tile_cost: f64, tile_cost_per: f64) -> f64 {
    total_tiles as f64 * (tile_cost / tile_cost_per)
}
