//! Tile matching: shape MSE for glyph palettes, RGB distance for emoji palettes.

use crate::palette::{ColorPalette, ColorSignature, GlyphPalette};
use crate::{MosaicError, Result};
use image::{GrayImage, RgbaImage};
use ndarray::Array2;

/// Best palette entry for one input tile.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Position of the entry in palette order
    pub index: usize,
    pub id: String,
    /// Lower is better
    pub distance: f64,
    /// Raw mean of the input tile; glyph matches only.
    pub brightness: Option<f64>,
}

/// Scale to [0, 1] and subtract the mean.
pub fn normalize_tile(tile: &GrayImage) -> Array2<f32> {
    let (w, h) = tile.dimensions();
    let mut grid = Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        tile.get_pixel(x as u32, y as u32).0[0] as f32 / 255.0
    });
    let mean = grid.mean().unwrap_or(0.0);
    grid.mapv_inplace(|v| v - mean);
    grid
}

/// Per-channel mean over all pixels, transparent ones included.
pub fn mean_rgb(img: &RgbaImage) -> ColorSignature {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return ColorSignature { r: 0.0, g: 0.0, b: 0.0 };
    }
    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for p in img.pixels() {
        r += p.0[0] as u64;
        g += p.0[1] as u64;
        b += p.0[2] as u64;
    }
    let n = count as f64;
    ColorSignature { r: r as f64 / n, g: g as f64 / n, b: b as f64 / n }
}

fn check_tile_shape(dimensions: (u32, u32), tile_size: u32) -> Result<()> {
    let (w, h) = dimensions;
    if (w, h) != (tile_size, tile_size) {
        return Err(MosaicError::Shape(format!(
            "input tile is {w}x{h}, expected {tile_size}x{tile_size}"
        )));
    }
    Ok(())
}

fn pixel_count((w, h): (u32, u32)) -> f64 {
    f64::from(w) * f64::from(h)
}

/// Index and distance of the smallest score; the first one wins ties.
fn argmin(scores: impl Iterator<Item = f64>) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, score) in scores.enumerate() {
        if best.map_or(!score.is_nan(), |(_, d)| score < d) {
            best = Some((i, score));
        }
    }
    best
}

impl GlyphPalette {
    /// Pick the rotation whose normalized mask has the lowest MSE against the
    /// normalized tile. Brightness is the tile's raw mean, independent of shape.
    pub fn match_tile(&self, tile: &GrayImage) -> Result<MatchResult> {
        check_tile_shape(tile.dimensions(), self.tile_size())?;
        if self.entries().is_empty() {
            return Err(MosaicError::Configuration("glyph palette is empty".into()));
        }

        let brightness =
            tile.pixels().map(|p| p.0[0] as f64).sum::<f64>() / pixel_count(tile.dimensions());

        let input = normalize_tile(tile);
        let scores = self.entries().iter().map(|entry| {
            let diff = &input - entry.mask.normalized();
            diff.mapv(|v| v * v).mean().map_or(f64::NAN, f64::from)
        });

        let (index, distance) =
            argmin(scores).ok_or_else(|| MosaicError::Match("no glyph rotation scored".into()))?;

        Ok(MatchResult {
            index,
            id: self.entries()[index].id.clone(),
            distance,
            brightness: Some(brightness),
        })
    }
}

impl ColorPalette {
    /// Pick the entry whose mean color is nearest in squared RGB distance.
    pub fn match_tile(&self, tile: &RgbaImage) -> Result<MatchResult> {
        check_tile_shape(tile.dimensions(), self.tile_size())?;
        if self.entries().is_empty() {
            return Err(MosaicError::Configuration("emoji palette is empty".into()));
        }

        let target = mean_rgb(tile);
        let scores = self.entries().iter().map(|entry| entry.signature.distance_sq(&target));

        let (index, distance) =
            argmin(scores).ok_or_else(|| MosaicError::Match("no emoji scored".into()))?;

        Ok(MatchResult {
            index,
            id: self.entries()[index].id.clone(),
            distance,
            brightness: None,
        })
    }
}
