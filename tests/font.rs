use fontdue::{Font, FontSettings};
use image::{imageops, DynamicImage, GrayImage, Luma};
use tilemosaic::config::DEFAULT_ROTATIONS;
use tilemosaic::glyph::{DEFAULT_FONT_SIZE, DEFAULT_ORIGIN};
use tilemosaic::render::INK_THRESHOLD;
use tilemosaic::{
    build_palette, FontGlyphs, GlyphConfig, GlyphPalette, GlyphSource, ImageChunker, Palette,
    PaletteConfig,
};

const DEJAVU: &[u8] = include_bytes!("assets/DejaVuSans.ttf");

fn dejavu(origin: (i32, i32)) -> FontGlyphs {
    let font = Font::from_bytes(DEJAVU, FontSettings::default()).unwrap();
    FontGlyphs::from_font(font, DEFAULT_FONT_SIZE, origin)
}

/// (min_x, min_y, max_x, max_y) of pixels darker than the ink threshold.
fn ink_bounds(img: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    img.enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] < INK_THRESHOLD)
        .fold(None, |acc, (x, y, _)| match acc {
            None => Some((x, y, x, y)),
            Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
        })
}

#[test]
fn letter_a_lands_below_origin_and_above_baseline() {
    let tile = dejavu(DEFAULT_ORIGIN).draw('a', 64).unwrap();
    assert_eq!(tile.dimensions(), (64, 64));

    let (min_x, min_y, max_x, max_y) = ink_bounds(&tile).expect("'a' should leave ink");
    // x-height of 'a' starts near y 15; its baseline sits at origin.y + ascent, near y 55.
    assert!((18..=26).contains(&min_x), "left edge {min_x}");
    assert!((50..=58).contains(&max_x), "right edge {max_x}");
    assert!((10..=20).contains(&min_y), "top edge {min_y}");
    assert!((52..=60).contains(&max_y), "bottom edge {max_y}");

    // Background stays white.
    assert_eq!(tile.get_pixel(0, 0).0[0], 255);
    assert_eq!(tile.get_pixel(63, 0).0[0], 255);
}

#[test]
fn glyph_is_clipped_at_tile_edges() {
    // Pushed right and down so most of the glyph falls outside the tile.
    let shifted = dejavu((40, 20)).draw('W', 64).unwrap();
    let (min_x, min_y, _, _) = ink_bounds(&shifted).expect("part of 'W' should stay visible");
    assert!(min_x >= 40);
    assert!(min_y >= 20);

    // Pushed up and left, past the top-left corner.
    let lifted = dejavu((-40, -60)).draw('W', 64).unwrap();
    assert_eq!(lifted.dimensions(), (64, 64));

    // Entirely outside.
    let gone = dejavu((200, 200)).draw('W', 64).unwrap();
    assert!(ink_bounds(&gone).is_none());
}

#[test]
fn missing_glyph_still_draws_a_tile() {
    let tile = dejavu(DEFAULT_ORIGIN).draw('\u{E000}', 64).unwrap();
    assert_eq!(tile.dimensions(), (64, 64));
}

#[test]
fn font_palette_rotations_differ() {
    let font = dejavu(DEFAULT_ORIGIN);
    let palette = GlyphPalette::build(&font, 'a', 64, &DEFAULT_ROTATIONS).unwrap();
    let masks: Vec<_> = palette.entries().iter().map(|e| e.mask.luminance()).collect();
    for (i, a) in masks.iter().enumerate() {
        for b in &masks[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn font_mosaic_quadrants_match_their_tiles() {
    let font_path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/assets/DejaVuSans.ttf");
    let config = PaletteConfig::Glyph(GlyphConfig::new('a', font_path));
    let palette = build_palette(&config).unwrap();
    let Palette::Glyph(glyphs) = &palette else {
        panic!("expected a glyph palette");
    };

    let input = GrayImage::from_fn(128, 128, |x, y| Luma([((x * 2 + y) % 256) as u8]));
    let output = tilemosaic::render_mosaic(&DynamicImage::ImageLuma8(input.clone()), 64, &palette)
        .unwrap()
        .to_luma8();
    assert_eq!(output.dimensions(), (128, 128));

    for tile in ImageChunker::new(&input, 64).unwrap().tiles() {
        let expected = glyphs.render_tile(&glyphs.match_tile(&tile.pixels).unwrap()).unwrap();
        let actual = imageops::crop_imm(&output, tile.x, tile.y, 64, 64).to_image();
        assert_eq!(actual, expected, "quadrant at ({}, {})", tile.x, tile.y);
    }
}
