use image::Rgba;
use serde::{Deserialize, Serialize};

pub const MIN_COLOR_COUNT: usize = 1;
pub const MAX_COLOR_COUNT: usize = 256;
pub const DEFAULT_EXPORT_SCALE: u32 = 8;

/// Everything the host UI lets the user tune for one mosaic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MosaicConfig {
    /// Mosaic width in tiles; the height follows the source aspect ratio.
    pub target_width: u32,
    /// Requested palette size (k for k-means).
    pub color_count: usize,
    pub show_grid: bool,
    /// Only honoured in the preview while `show_grid` is on.
    pub show_color_numbers: bool,
    pub tile_size: f64,
    pub tile_size_unit: String,
    /// Price of `tile_cost_per` tiles.
    pub tile_cost: f64,
    pub tile_cost_per: f64,
    pub currency: String,
    pub output_unit: String,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            target_width: 32,
            color_count: 6,
            show_grid: false,
            show_color_numbers: false,
            tile_size: 10.0,
            tile_size_unit: "mm".to_string(),
            tile_cost: 5.0,
            tile_cost_per: 100.0,
            currency: "€".to_string(),
            output_unit: "mm".to_string(),
        }
    }
}

impl MosaicConfig {
    /// Clamp user-entered values into the ranges the engine expects.
    ///
    /// The engine itself trusts its config; this is the form layer's job and
    /// is applied by the WASM surface before handing values over.
    pub fn sanitized(mut self) -> Self {
        self.target_width = self.target_width.max(1);
        self.color_count = self.color_count.clamp(MIN_COLOR_COUNT, MAX_COLOR_COUNT);
        if !(self.tile_size >= 0.1) {
            self.tile_size = 0.1;
        }
        if !(self.tile_cost_per >= 1.0) {
            self.tile_cost_per = 1.0;
        }
        if !(self.tile_cost >= 0.0) {
            self.tile_cost = 0.0;
        }
        self.show_color_numbers &= self.show_grid;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn background(self) -> Rgba<u8> {
        match self {
            Theme::Dark => Rgba([0x28, 0x2c, 0x34, 0xff]),
            Theme::Light => Rgba([0xff, 0xff, 0xff, 0xff]),
        }
    }

    pub fn foreground(self) -> Rgba<u8> {
        match self {
            Theme::Dark => Rgba([0x61, 0xda, 0xfb, 0xff]),
            Theme::Light => Rgba([0x28, 0x2c, 0x34, 0xff]),
        }
    }
}

/// What goes into the downloadable template. Independent of the preview flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub include_grid: bool,
    pub include_color_numbers: bool,
    pub include_palette: bool,
    pub include_stats: bool,
    /// Pixels per source pixel in the exported mosaic.
    pub scale: u32,
    pub theme: Theme,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_grid: true,
            include_color_numbers: true,
            include_palette: true,
            include_stats: true,
            scale: DEFAULT_EXPORT_SCALE,
            theme: Theme::Dark,
        }
    }
}
