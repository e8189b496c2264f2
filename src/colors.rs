use std::str::FromStr;

use palette::Srgb;

use crate::error::{MosaicError, Result};

/// One quantized color and the number of tiles that use it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteEntry {
    /// Position in the palette (0-based; labels show `index + 1`).
    pub index: usize,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub hex: String,
    pub tile_count: usize,
}

impl PaletteEntry {
    pub fn new(index: usize, color: Srgb<u8>, tile_count: usize) -> Self {
        Self {
            index,
            r: color.red,
            g: color.green,
            b: color.blue,
            hex: hex_string(color),
            tile_count,
        }
    }

    pub fn color(&self) -> Srgb<u8> {
        Srgb::new(self.r, self.g, self.b)
    }

    /// Replace the color fields, leaving index and tile count alone.
    pub(crate) fn set_color(&mut self, color: Srgb<u8>) {
        self.r = color.red;
        self.g = color.green;
        self.b = color.blue;
        self.hex = hex_string(color);
    }
}

/// Lowercase `#rrggbb`.
pub fn hex_string(c: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
}

/// Parse `#rrggbb`, `rrggbb` or `#rgb`.
pub fn parse_hex(s: &str) -> Result<Srgb<u8>> {
    Srgb::from_str(s.trim()).map_err(|e| MosaicError::InvalidColor(format!("{s:?}: {e}")))
}

/// Rec. 709 luma on the 0-255 scale, used to pick readable label colors.
pub fn luminance(c: Srgb<u8>) -> f32 {
    0.2126 * c.red as f32 + 0.7152 * c.green as f32 + 0.0722 * c.blue as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_string_is_lowercase_padded() {
        assert_eq!(hex_string(Srgb::new(255, 0, 10)), "#ff000a");
    }

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(parse_hex("#12ab34").unwrap(), Srgb::new(0x12, 0xab, 0x34));
        assert_eq!(parse_hex("12AB34").unwrap(), Srgb::new(0x12, 0xab, 0x34));
        assert_eq!(parse_hex("#fff").unwrap(), Srgb::new(255, 255, 255));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(
            parse_hex("#12345"),
            Err(MosaicError::InvalidColor(_))
        ));
        assert!(matches!(
            parse_hex("#gg0000"),
            Err(MosaicError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_set_color_keeps_count() {
        let mut entry = PaletteEntry::new(2, Srgb::new(1, 2, 3), 9);
        entry.set_color(Srgb::new(255, 255, 0));
        assert_eq!(entry.hex, "#ffff00");
        assert_eq!(entry.tile_count, 9);
        assert_eq!(entry.index, 2);
    }

    #[test]
    fn test_luminance_orders_black_white() {
        assert!(luminance(Srgb::new(0, 0, 0)) < luminance(Srgb::new(255, 255, 255)));
    }
}
