//! Glyph rasterization and rotation for the glyph palette.

use crate::{MosaicError, Result};
use fontdue::{Font, FontSettings};
use image::{GrayImage, Luma};
use std::path::Path;

pub const DEFAULT_FONT_SIZE: f32 = 70.0;
/// Pen position of the glyph's ascender line, relative to the tile's top-left.
pub const DEFAULT_ORIGIN: (i32, i32) = (16, -10);

const WHITE: Luma<u8> = Luma([255]);

/// Draws one character, black ink on white, onto a square canvas.
pub trait GlyphSource {
    fn draw(&self, ch: char, tile_size: u32) -> Result<GrayImage>;
}

/// [`GlyphSource`] backed by a TrueType/OpenType font.
pub struct FontGlyphs {
    font: Font,
    font_size: f32,
    origin: (i32, i32),
}

impl FontGlyphs {
    pub fn new(font_path: impl AsRef<Path>, font_size: f32, origin: (i32, i32)) -> Result<Self> {
        let path = font_path.as_ref();
        let font_data = std::fs::read(path).map_err(|e| {
            MosaicError::Configuration(format!("cannot read font {}: {e}", path.display()))
        })?;
        let font = Font::from_bytes(font_data, FontSettings::default()).map_err(|e| {
            MosaicError::Configuration(format!("cannot parse font {}: {e}", path.display()))
        })?;
        Ok(Self::from_font(font, font_size, origin))
    }

    pub fn from_font(font: Font, font_size: f32, origin: (i32, i32)) -> Self {
        Self { font, font_size, origin }
    }
}

impl GlyphSource for FontGlyphs {
    fn draw(&self, ch: char, tile_size: u32) -> Result<GrayImage> {
        let mut img = GrayImage::from_pixel(tile_size, tile_size, WHITE);

        if self.font.lookup_glyph_index(ch) == 0 {
            log::warn!("font has no glyph for {ch:?}, drawing the fallback glyph");
        }

        let (metrics, bitmap) = self.font.rasterize(ch, self.font_size);
        if metrics.width == 0 || metrics.height == 0 {
            return Ok(img);
        }

        let ascent = self
            .font
            .horizontal_line_metrics(self.font_size)
            .map(|m| m.ascent)
            .unwrap_or(self.font_size);
        let baseline_y = self.origin.1 + ascent.round() as i32;

        let x_offset = self.origin.0 + metrics.xmin;
        let y_offset = baseline_y - metrics.height as i32 - metrics.ymin;

        let size = tile_size as i32;
        for sy in 0..metrics.height {
            for sx in 0..metrics.width {
                let tx = x_offset + sx as i32;
                let ty = y_offset + sy as i32;
                if tx >= 0 && tx < size && ty >= 0 && ty < size {
                    let coverage = bitmap[sy * metrics.width + sx];
                    let pixel = img.get_pixel_mut(tx as u32, ty as u32);
                    pixel.0[0] = pixel.0[0].min(255 - coverage);
                }
            }
        }

        Ok(img)
    }
}

/// Rotate counter-clockwise by `degrees` about the image center, keeping the
/// canvas size. Uses nearest-neighbour sampling; uncovered pixels get `fill`.
pub fn rotate_about_center(img: &GrayImage, degrees: f32, fill: u8) -> GrayImage {
    if degrees == 0.0 {
        return img.clone();
    }

    let (w, h) = img.dimensions();
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let (sin, cos) = (degrees as f64).to_radians().sin_cos();

    GrayImage::from_fn(w, h, |x, y| {
        let dx = x as f64 + 0.5 - cx;
        let dy = y as f64 + 0.5 - cy;
        let sx = (cx + dx * cos - dy * sin).floor();
        let sy = (cy + dx * sin + dy * cos).floor();
        if sx >= 0.0 && sy >= 0.0 && sx < w as f64 && sy < h as f64 {
            *img.get_pixel(sx as u32, sy as u32)
        } else {
            Luma([fill])
        }
    })
}

/// Fontless glyph for tests: a black vertical bar, so each rotation is distinct.
#[cfg(test)]
pub(crate) struct BarGlyph;

#[cfg(test)]
impl GlyphSource for BarGlyph {
    fn draw(&self, _ch: char, tile_size: u32) -> Result<GrayImage> {
        let (x0, x1) = (tile_size * 3 / 8, tile_size * 5 / 8);
        let (y0, y1) = (tile_size / 8, tile_size * 7 / 8);
        Ok(GrayImage::from_fn(tile_size, tile_size, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                Luma([0])
            } else {
                WHITE
            }
        }))
    }
}
