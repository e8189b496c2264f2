use image::{Rgba, RgbaImage};
use image_to_mosaic_wasm::export::encode_png;
use image_to_mosaic_wasm::units;
use image_to_mosaic_wasm::{
    ConfigChange, ExportOptions, LoadStatus, MosaicConfig, MosaicSession, SourceImage, downsample,
    quantize,
};
use pretty_assertions::assert_eq;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Four horizontal bands plus a transparent right-hand column.
fn banded(w: u32, h: u32) -> RgbaImage {
    let bands = [
        Rgba([240, 200, 40, 255]),
        Rgba([30, 120, 60, 255]),
        Rgba([20, 40, 160, 255]),
        Rgba([200, 60, 50, 255]),
    ];
    RgbaImage::from_fn(w, h, |x, y| {
        if x >= w - w / 8 {
            CLEAR
        } else {
            bands[(y * 4 / h) as usize]
        }
    })
}

#[test]
fn test_two_by_two_scenario() {
    let img = RgbaImage::from_fn(2, 2, |_, y| if y == 0 { RED } else { BLUE });
    let source = SourceImage::from_rgba(img).unwrap();
    let mut grid = downsample(&source, 2).unwrap();
    let q = quantize(&mut grid, 2);

    let summary: Vec<(u8, u8, u8, usize)> = q
        .palette
        .iter()
        .map(|e| (e.r, e.g, e.b, e.tile_count))
        .collect();
    assert_eq!(summary, vec![(255, 0, 0, 2), (0, 0, 255, 2)]);
}

#[test]
fn test_session_end_to_end() {
    let mut session = MosaicSession::new(MosaicConfig {
        target_width: 16,
        color_count: 4,
        ..MosaicConfig::default()
    });
    let png = encode_png(banded(160, 80)).unwrap();
    assert_eq!(session.load_png(&png).unwrap(), LoadStatus::Installed);

    let grid = session.grid().unwrap();
    assert_eq!(grid.dimensions(), (16, 8));
    let opaque = grid.pixels().filter(|p| p.0[3] > 0).count();
    assert_eq!(opaque, 14 * 8);

    let palette = session.palette();
    assert_eq!(palette.len(), 4);
    assert_eq!(palette.iter().map(|e| e.tile_count).sum::<usize>(), opaque);
    assert_eq!(session.assignment().unwrap().len(), opaque);

    let stats = session.stats().unwrap();
    assert_eq!(stats.total_tiles, units::total_tiles(16, 160, 80));
    assert_eq!(stats.width_size, "160.0 mm");

    session.apply(ConfigChange::ShowGrid(true)).unwrap();
    session.apply(ConfigChange::ShowColorNumbers(true)).unwrap();
    assert_eq!(session.preview().unwrap().dimensions(), (200, 120));

    session.recolor_hex(2, "#ffffff").unwrap();
    let recolored: Vec<usize> = session
        .assignment()
        .unwrap()
        .positions_of(2)
        .collect();
    let grid = session.grid().unwrap();
    for position in recolored {
        let x = position as u32 % 16;
        let y = position as u32 / 16;
        assert_eq!(grid.get_pixel(x, y), &Rgba([255, 255, 255, 255]));
    }

    let artifact = session.export(&ExportOptions::default()).unwrap();
    // 160x80 at 8x, 160px padding, then palette (160) and stats (140) panels.
    assert_eq!((artifact.width, artifact.height), (1600, 960 + 160 + 140));
    assert!(artifact.data_uri().starts_with("data:image/png;base64,"));
}

#[test]
fn test_export_matches_preview_palette() {
    let mut session = MosaicSession::new(MosaicConfig {
        target_width: 8,
        color_count: 3,
        ..MosaicConfig::default()
    });
    session.load_png(&encode_png(banded(64, 64)).unwrap()).unwrap();
    session.recolor_hex(0, "#123456").unwrap();

    let options = ExportOptions {
        include_grid: false,
        include_color_numbers: false,
        include_palette: false,
        include_stats: false,
        scale: 1,
        ..ExportOptions::default()
    };
    let artifact = session.export(&options).unwrap();
    let exported = image::load_from_memory(&artifact.png).unwrap().to_rgba8();

    // At 1x with no overlay the export is the preview drawn on the theme background.
    let preview = session.preview().unwrap();
    assert_eq!(exported.dimensions(), preview.dimensions());
    for (x, y, p) in preview.enumerate_pixels() {
        if p.0[3] == 255 {
            assert_eq!(exported.get_pixel(x, y), p, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn test_unit_scenarios() {
    assert_eq!(units::convert_size(10.0, "cm", "mm"), 100.0);
    assert_eq!(units::convert_area(1.0, "m", "mm"), 1_000_000.0);
    assert_eq!(units::format_cost(12.345, "$"), "$12.35");
    assert_eq!(units::total_tiles(32, 1920, 1080), 576);
}
