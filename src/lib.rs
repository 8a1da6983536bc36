//! Image to tile mosaic converter using glyph and emoji palettes.

pub mod chunk;
pub mod config;
pub mod glyph;
pub mod matcher;
pub mod palette;
pub mod render;

pub use chunk::{ImageChunker, InputTile};
pub use config::{EmojiConfig, Fit, GlyphConfig, PaletteConfig};
pub use glyph::{FontGlyphs, GlyphSource};
pub use matcher::MatchResult;
pub use palette::{build_palette, ColorPalette, GlyphPalette, Palette};
pub use render::TilePalette;

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer};
use rayon::prelude::*;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MosaicError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Shape error: {0}")]
    Shape(String),
    #[error("Match error: {0}")]
    Match(String),
    #[error("Mosaic cancelled")]
    Cancelled,
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MosaicError>;

/// Shared flag an outside caller sets to abort a running mosaic.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Where one tile landed and what it matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub id: String,
    pub distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
}

/// Assembled output plus the per-tile match report, in row-major order.
#[derive(Debug, Clone)]
pub struct Mosaic<I> {
    pub image: I,
    pub placements: Vec<Placement>,
}

/// Main driver: extract tiles, match and render each, then assemble the canvas.
pub struct MosaicRenderer<'p, P: TilePalette> {
    palette: &'p P,
    cancel: Option<CancelToken>,
    parallel: bool,
}

impl<'p, P: TilePalette> MosaicRenderer<'p, P> {
    pub fn new(palette: &'p P) -> Self {
        Self { palette, cancel: None, parallel: true }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn render(
        &self,
        image: &ImageBuffer<P::Pixel, Vec<u8>>,
    ) -> Result<ImageBuffer<P::Pixel, Vec<u8>>> {
        Ok(self.render_with_placements(image)?.image)
    }

    /// Any tile failure or cancellation aborts the whole run; no partial canvas is returned.
    pub fn render_with_placements(
        &self,
        image: &ImageBuffer<P::Pixel, Vec<u8>>,
    ) -> Result<Mosaic<ImageBuffer<P::Pixel, Vec<u8>>>> {
        let tile_size = self.palette.tile_size();
        let chunker = ImageChunker::new(image, tile_size)?;
        let (cols, rows) = chunker.grid();
        let (out_w, out_h) = chunker.usable_dimensions();

        if chunker.is_empty() {
            log::warn!(
                "Input {}x{} is smaller than one {tile_size}px tile, nothing to render",
                image.width(),
                image.height()
            );
            return Ok(Mosaic { image: P::blank_canvas(0, 0), placements: Vec::new() });
        }

        log::info!("Input image: {}x{}", image.width(), image.height());
        log::info!("Grid: {cols}x{rows} tiles of size {tile_size}x{tile_size}");

        let tiles = chunker.tiles();
        type Rendered<Px> = (MatchResult, ImageBuffer<Px, Vec<u8>>);
        let process = |tile: &InputTile<P::Pixel>| -> Result<Rendered<P::Pixel>> {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                return Err(MosaicError::Cancelled);
            }
            let matched = self.palette.find_best_match(&tile.pixels)?;
            let block = self.palette.render(&matched)?;
            Ok((matched, block))
        };

        // With several failing tiles, the parallel path may report any one of them.
        let rendered: Vec<_> = if self.parallel {
            tiles.par_iter().map(&process).collect::<Result<Vec<_>>>()?
        } else {
            tiles.iter().map(&process).collect::<Result<Vec<_>>>()?
        };

        let mut canvas = P::blank_canvas(out_w, out_h);
        let mut placements = Vec::with_capacity(tiles.len());
        for (i, (tile, (matched, block))) in tiles.iter().zip(rendered).enumerate() {
            P::place(&mut canvas, &block, tile.x, tile.y);
            if i % 10 == 0 {
                log::debug!("Placed tile {i}/{}", tiles.len());
            }
            placements.push(Placement {
                x: tile.x,
                y: tile.y,
                id: matched.id,
                distance: matched.distance,
                brightness: matched.brightness,
            });
        }

        Ok(Mosaic { image: canvas, placements })
    }
}

/// Driver settings for [`Palette::render`].
#[derive(Debug, Clone)]
pub struct MosaicOptions {
    pub fit: Fit,
    pub parallel: bool,
    pub cancel: Option<CancelToken>,
}

impl Default for MosaicOptions {
    fn default() -> Self {
        Self { fit: Fit::Crop, parallel: true, cancel: None }
    }
}

impl Palette {
    /// Grayscale output for glyph palettes, RGBA for emoji palettes.
    pub fn render(
        &self,
        image: &DynamicImage,
        options: &MosaicOptions,
    ) -> Result<Mosaic<DynamicImage>> {
        let image = fit_to_grid(image, self.tile_size(), options.fit);
        match self {
            Palette::Glyph(p) => {
                let mosaic = configure(MosaicRenderer::new(p), options)
                    .render_with_placements(&image.to_luma8())?;
                Ok(Mosaic {
                    image: DynamicImage::ImageLuma8(mosaic.image),
                    placements: mosaic.placements,
                })
            }
            Palette::Color(p) => {
                let mosaic = configure(MosaicRenderer::new(p), options)
                    .render_with_placements(&image.to_rgba8())?;
                Ok(Mosaic {
                    image: DynamicImage::ImageRgba8(mosaic.image),
                    placements: mosaic.placements,
                })
            }
        }
    }
}

fn configure<'p, P: TilePalette>(
    renderer: MosaicRenderer<'p, P>,
    options: &MosaicOptions,
) -> MosaicRenderer<'p, P> {
    let renderer = renderer.with_parallel(options.parallel);
    match &options.cancel {
        Some(token) => renderer.with_cancel(token.clone()),
        None => renderer,
    }
}

/// Under [`Fit::Stretch`], resample to the largest tile multiples. Otherwise
/// the image is returned as-is and the chunker crops.
pub fn fit_to_grid(image: &DynamicImage, tile_size: u32, fit: Fit) -> Cow<'_, DynamicImage> {
    if fit == Fit::Crop || tile_size == 0 {
        return Cow::Borrowed(image);
    }
    let (w, h) = (image.width(), image.height());
    let (fit_w, fit_h) = ((w / tile_size) * tile_size, (h / tile_size) * tile_size);
    if fit_w == 0 || fit_h == 0 || (fit_w, fit_h) == (w, h) {
        return Cow::Borrowed(image);
    }
    log::debug!("Resampling {w}x{h} to {fit_w}x{fit_h}");
    Cow::Owned(image.resize_exact(fit_w, fit_h, FilterType::CatmullRom))
}

/// Render `image` with a prebuilt palette. `tile_size` must match the palette's.
pub fn render_mosaic(
    image: &DynamicImage,
    tile_size: u32,
    palette: &Palette,
) -> Result<DynamicImage> {
    if tile_size != palette.tile_size() {
        return Err(MosaicError::Shape(format!(
            "tile size {tile_size} does not match palette tile size {}",
            palette.tile_size()
        )));
    }
    Ok(palette.render(image, &MosaicOptions::default())?.image)
}
