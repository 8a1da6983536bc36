//! Tile rendering and the [`TilePalette`] seam used by the mosaic driver.

use crate::matcher::MatchResult;
use crate::palette::{ColorPalette, GlyphPalette};
use crate::{MosaicError, Result};
use image::{imageops, GrayImage, ImageBuffer, Luma, Pixel, Rgba, RgbaImage};

/// Mask pixels darker than this count as glyph ink.
pub const INK_THRESHOLD: u8 = 128;

/// A palette the driver can match tiles against and render from.
pub trait TilePalette: Sync {
    type Pixel: Pixel<Subpixel = u8> + Send + Sync + 'static;

    fn tile_size(&self) -> u32;

    fn find_best_match(&self, tile: &ImageBuffer<Self::Pixel, Vec<u8>>) -> Result<MatchResult>;

    fn render(&self, matched: &MatchResult) -> Result<ImageBuffer<Self::Pixel, Vec<u8>>>;

    /// Empty output canvas
    fn blank_canvas(width: u32, height: u32) -> ImageBuffer<Self::Pixel, Vec<u8>>;

    /// Write a rendered block at its tile's top-left corner.
    fn place(
        canvas: &mut ImageBuffer<Self::Pixel, Vec<u8>>,
        block: &ImageBuffer<Self::Pixel, Vec<u8>>,
        x: u32,
        y: u32,
    ) {
        imageops::replace(canvas, block, i64::from(x), i64::from(y));
    }
}

fn unknown_entry(matched: &MatchResult) -> MosaicError {
    MosaicError::Match(format!(
        "entry {} ({}) is not in this palette",
        matched.index, matched.id
    ))
}

impl GlyphPalette {
    /// White tile with the matched mask's ink filled at the tile's brightness.
    pub fn render_tile(&self, matched: &MatchResult) -> Result<GrayImage> {
        let entry = self
            .entries()
            .get(matched.index)
            .ok_or_else(|| unknown_entry(matched))?;
        let brightness = matched.brightness.ok_or_else(|| {
            MosaicError::Match(format!("glyph match {} has no brightness", matched.id))
        })?;
        let ink = Luma([brightness.clamp(0.0, 255.0) as u8]);

        let mask = entry.mask.luminance();
        let size = self.tile_size();
        Ok(GrayImage::from_fn(size, size, |x, y| {
            if mask[[y as usize, x as usize]] < INK_THRESHOLD {
                ink
            } else {
                Luma([255])
            }
        }))
    }
}

impl ColorPalette {
    /// The matched emoji's pixels, alpha included.
    pub fn render_tile(&self, matched: &MatchResult) -> Result<RgbaImage> {
        self.entries()
            .get(matched.index)
            .map(|entry| entry.image.clone())
            .ok_or_else(|| unknown_entry(matched))
    }
}

impl TilePalette for GlyphPalette {
    type Pixel = Luma<u8>;

    fn tile_size(&self) -> u32 {
        GlyphPalette::tile_size(self)
    }

    fn find_best_match(&self, tile: &GrayImage) -> Result<MatchResult> {
        self.match_tile(tile)
    }

    fn render(&self, matched: &MatchResult) -> Result<GrayImage> {
        self.render_tile(matched)
    }

    fn blank_canvas(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255]))
    }
}

impl TilePalette for ColorPalette {
    type Pixel = Rgba<u8>;

    fn tile_size(&self) -> u32 {
        ColorPalette::tile_size(self)
    }

    fn find_best_match(&self, tile: &RgbaImage) -> Result<MatchResult> {
        self.match_tile(tile)
    }

    fn render(&self, matched: &MatchResult) -> Result<RgbaImage> {
        self.render_tile(matched)
    }

    fn blank_canvas(width: u32, height: u32) -> RgbaImage {
        RgbaImage::new(width, height)
    }

    /// Alpha-composite, so transparent emoji edges show the canvas beneath.
    fn place(canvas: &mut RgbaImage, block: &RgbaImage, x: u32, y: u32) {
        imageops::overlay(canvas, block, i64::from(x), i64::from(y));
    }
}
