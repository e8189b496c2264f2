use crate::config::MosaicConfig;
use crate::units;

/// The size/cost table shown under the palette.
#[derive(Clone, Debug, PartialEq)]
pub struct MosaicStats {
    pub width_tiles: u32,
    pub height_tiles: u32,
    pub total_tiles: u64,
    pub width_size: String,
    pub height_size: String,
    pub total_area: String,
    pub total_cost: String,
    pub output_unit: String,
}

/// One formatted table row: metric, tiles, size, cost.
pub type StatRow = [String; 4];

impl MosaicStats {
    pub fn compute(config: &MosaicConfig, source_width: u32, source_height: u32) -> Self {
        let width_tiles = config.target_width;
        let height_tiles = units::tile_height(width_tiles, source_width, source_height);
        let total_tiles = width_tiles as u64 * height_tiles as u64;
        let unit = config.tile_size_unit.as_str();
        let out = config.output_unit.as_str();

        Self {
            width_tiles,
            height_tiles,
            total_tiles,
            width_size: units::format_size(width_tiles as f64 * config.tile_size, unit, out),
            height_size: units::format_size(height_tiles as f64 * config.tile_size, unit, out),
            total_area: units::format_area(
                total_tiles as f64 * config.tile_size * config.tile_size,
                unit,
                out,
            ),
            total_cost: units::format_cost(
                units::tiles_cost(total_tiles, config.tile_cost, config.tile_cost_per),
                &config.currency,
            ),
            output_unit: config.output_unit.clone(),
        }
    }

    pub fn header(&self) -> StatRow {
        [
            "Metric".to_string(),
            "Tiles".to_string(),
            format!("Size in {}", self.output_unit),
            "Cost".to_string(),
        ]
    }

    pub fn rows(&self) -> [StatRow; 3] {
        [
            [
                "Width".to_string(),
                self.width_tiles.to_string(),
                self.width_size.clone(),
                "-".to_string(),
            ],
            [
                "Height".to_string(),
                self.height_tiles.to_string(),
                self.height_size.clone(),
                "-".to_string(),
            ],
            [
                "Total".to_string(),
                self.total_tiles.to_string(),
                self.total_area.clone(),
                self.total_cost.clone(),
            ],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_hd_defaults() {
        let stats = MosaicStats::compute(&MosaicConfig::default(), 1920, 1080);
        assert_eq!(
            stats,
            MosaicStats {
                width_tiles: 32,
                height_tiles: 18,
                total_tiles: 576,
                width_size: "320.0 mm".to_string(),
                height_size: "180.0 mm".to_string(),
                total_area: "57600 mm²".to_string(),
                total_cost: "€28.80".to_string(),
                output_unit: "mm".to_string(),
            }
        );
    }

    #[test]
    fn test_units_and_currency() {
        let config = MosaicConfig {
            target_width: 10,
            tile_size: 2.0,
            tile_size_unit: "cm".to_string(),
            output_unit: "m".to_string(),
            tile_cost: 3.0,
            tile_cost_per: 4.0,
            currency: "$".to_string(),
            ..MosaicConfig::default()
        };
        let stats = MosaicStats::compute(&config, 100, 50);
        assert_eq!(stats.width_size, "0.20 m");
        assert_eq!(stats.height_size, "0.10 m");
        assert_eq!(stats.total_area, "0.02 m²");
        assert_eq!(stats.total_cost, "$37.50");
    }

    #[test]
    fn test_rows() {
        let stats = MosaicStats::compute(&MosaicConfig::default(), 1920, 1080);
        assert_eq!(stats.header()[2], "Size in mm");
        let rows = stats.rows();
        assert_eq!(rows[0][0], "Width");
        assert_eq!(rows[1][3], "-");
        assert_eq!(rows[2][1], "576");
        assert_eq!(rows[2][3], "€28.80");
    }
}
