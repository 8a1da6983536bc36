use image::{imageops, DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use tilemosaic::config::DEFAULT_ROTATIONS;
use tilemosaic::{
    build_palette, render_mosaic, ColorPalette, EmojiConfig, GlyphPalette, GlyphSource,
    ImageChunker, MosaicError, MosaicOptions, MosaicRenderer, Palette, PaletteConfig,
};

/// Draws a black wedge: thick at the top, thin at the bottom.
struct Wedge;

impl GlyphSource for Wedge {
    fn draw(&self, _ch: char, tile_size: u32) -> tilemosaic::Result<GrayImage> {
        let mid = tile_size / 2;
        Ok(GrayImage::from_fn(tile_size, tile_size, |x, y| {
            let half_width = (tile_size - y) / 4;
            if y > tile_size / 8 && x + half_width >= mid && x <= mid + half_width {
                Luma([0])
            } else {
                Luma([255])
            }
        }))
    }
}

fn portrait(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let dx = x as i32 - width as i32 / 2;
        let dy = y as i32 - height as i32 / 2;
        Luma([((dx * dx + dy * dy) / 40).clamp(0, 255) as u8])
    })
}

#[test]
fn glyph_mosaic_quadrants_match_their_tiles() {
    let palette = GlyphPalette::build(&Wedge, 'a', 64, &DEFAULT_ROTATIONS).unwrap();
    let input = portrait(128, 128);

    let output = render_mosaic(
        &DynamicImage::ImageLuma8(input.clone()),
        64,
        &Palette::Glyph(palette.clone()),
    )
    .unwrap();
    let DynamicImage::ImageLuma8(output) = output else {
        panic!("glyph mosaic should be grayscale");
    };
    assert_eq!(output.dimensions(), (128, 128));

    let chunker = ImageChunker::new(&input, 64).unwrap();
    assert_eq!(chunker.grid(), (2, 2));
    for tile in chunker.tiles() {
        let matched = palette.match_tile(&tile.pixels).unwrap();
        let expected = palette.render_tile(&matched).unwrap();
        let actual = imageops::crop_imm(&output, tile.x, tile.y, 64, 64).to_image();
        assert_eq!(actual, expected, "quadrant at ({}, {})", tile.x, tile.y);
    }
}

#[test]
fn glyph_palette_rebuild_gives_same_matches() {
    let input = portrait(96, 96);
    let first = GlyphPalette::build(&Wedge, 'a', 32, &DEFAULT_ROTATIONS).unwrap();
    let second = GlyphPalette::build(&Wedge, 'a', 32, &DEFAULT_ROTATIONS).unwrap();

    let a = MosaicRenderer::new(&first).render_with_placements(&input).unwrap();
    let b = MosaicRenderer::new(&second).render_with_placements(&input).unwrap();
    assert_eq!(a.placements, b.placements);
    assert_eq!(a.image, b.image);
}

#[test]
fn single_emoji_fills_every_tile() {
    let dir = tempfile::tempdir().unwrap();
    let apple = RgbaImage::from_pixel(72, 72, Rgba([200, 50, 50, 255]));
    apple.save(dir.path().join("apple.png")).unwrap();

    let config = PaletteConfig::Emoji(EmojiConfig::new(dir.path()));
    let palette = build_palette(&config).unwrap();
    assert_eq!(palette.ids(), vec!["apple.png"]);

    let input = RgbImage::from_fn(144, 144, |x, y| Rgb([x as u8, y as u8, 255 - x as u8]));
    let mosaic = palette
        .render(&DynamicImage::ImageRgb8(input), &MosaicOptions::default())
        .unwrap();

    let output = mosaic.image.to_rgba8();
    assert_eq!(output.dimensions(), (144, 144));
    assert_eq!(mosaic.placements.len(), 4);
    for placement in &mosaic.placements {
        assert_eq!(placement.id, "apple.png");
        let tile = imageops::crop_imm(&output, placement.x, placement.y, 72, 72).to_image();
        assert_eq!(tile, apple);
    }
}

#[test]
fn emoji_closest_color_is_placed_per_tile() {
    let dir = tempfile::tempdir().unwrap();
    RgbaImage::from_pixel(8, 8, Rgba([250, 250, 250, 255]))
        .save(dir.path().join("cloud.png"))
        .unwrap();
    RgbaImage::from_pixel(8, 8, Rgba([10, 10, 10, 255]))
        .save(dir.path().join("night.png"))
        .unwrap();

    let palette = Palette::Color(ColorPalette::build(dir.path(), 8).unwrap());
    let input = RgbImage::from_fn(16, 8, |x, _| {
        if x < 8 {
            Rgb([240, 240, 235])
        } else {
            Rgb([20, 0, 30])
        }
    });
    let mosaic = palette
        .render(&DynamicImage::ImageRgb8(input), &MosaicOptions::default())
        .unwrap();

    let ids: Vec<&str> = mosaic.placements.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["cloud.png", "night.png"]);
    let output = mosaic.image.to_rgba8();
    assert_eq!(*output.get_pixel(3, 3), Rgba([250, 250, 250, 255]));
    assert_eq!(*output.get_pixel(12, 3), Rgba([10, 10, 10, 255]));
}

#[test]
fn empty_emoji_directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = PaletteConfig::Emoji(EmojiConfig::new(dir.path()));
    assert!(matches!(build_palette(&config), Err(MosaicError::Configuration(_))));
}

#[test]
fn palette_from_json_config() {
    let dir = tempfile::tempdir().unwrap();
    let emojis = dir.path().join("emojis");
    std::fs::create_dir(&emojis).unwrap();
    RgbaImage::from_pixel(72, 72, Rgba([0, 128, 0, 255]))
        .save(emojis.join("leaf.png"))
        .unwrap();

    let config_path = dir.path().join("palette.json");
    let json = serde_json::json!({ "mode": "emoji", "dir": emojis, "tile_size": 36 });
    std::fs::write(&config_path, json.to_string()).unwrap();

    let palette = build_palette(&PaletteConfig::from_json_file(&config_path).unwrap()).unwrap();
    assert_eq!(palette.tile_size(), 36);
    let Palette::Color(colors) = &palette else {
        panic!("expected an emoji palette");
    };
    assert_eq!(colors.entries()[0].image.dimensions(), (36, 36));
}
