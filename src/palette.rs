//! Palette construction: glyph rotations or a directory of emoji images.

use crate::config::PaletteConfig;
use crate::glyph::{rotate_about_center, FontGlyphs, GlyphSource};
use crate::matcher::{mean_rgb, normalize_tile};
use crate::{MosaicError, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbaImage};
use ndarray::Array2;
use std::path::Path;

/// Luminance grid of a rendered glyph, plus its zero-centered form used for matching.
#[derive(Debug, Clone)]
pub struct GlyphMask {
    luminance: Array2<u8>,
    normalized: Array2<f32>,
}

impl GlyphMask {
    pub fn from_image(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let luminance = Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
            img.get_pixel(x as u32, y as u32).0[0]
        });
        let normalized = normalize_tile(img);
        Self { luminance, normalized }
    }

    /// Raw luminance indexed as `[row, column]`
    pub fn luminance(&self) -> &Array2<u8> {
        &self.luminance
    }

    pub fn normalized(&self) -> &Array2<f32> {
        &self.normalized
    }
}

#[derive(Debug, Clone)]
pub struct GlyphEntry {
    /// Rotation angle formatted as text, e.g. "-15"
    pub id: String,
    pub rotation: f32,
    pub mask: GlyphMask,
}

/// One character pre-rendered at a fixed set of rotations.
#[derive(Debug, Clone)]
pub struct GlyphPalette {
    character: char,
    tile_size: u32,
    entries: Vec<GlyphEntry>,
}

impl GlyphPalette {
    /// Draw `character` once, then store one mask per rotation, in the given order.
    pub fn build(
        source: &impl GlyphSource,
        character: char,
        tile_size: u32,
        rotations: &[f32],
    ) -> Result<Self> {
        if tile_size == 0 {
            return Err(MosaicError::Shape("tile size must be greater than zero".into()));
        }
        if rotations.is_empty() {
            return Err(MosaicError::Configuration(
                "glyph palette needs at least one rotation".into(),
            ));
        }

        log::info!("Building glyph palette for {character:?}...");

        let upright = source.draw(character, tile_size)?;
        if upright.dimensions() != (tile_size, tile_size) {
            let (w, h) = upright.dimensions();
            return Err(MosaicError::Shape(format!(
                "glyph canvas is {w}x{h}, expected {tile_size}x{tile_size}"
            )));
        }

        let mut entries: Vec<GlyphEntry> = Vec::with_capacity(rotations.len());
        for &rotation in rotations {
            if !rotation.is_finite() {
                return Err(MosaicError::Configuration(format!("invalid rotation {rotation}")));
            }
            if entries.iter().any(|e| e.rotation == rotation) {
                return Err(MosaicError::Configuration(format!("duplicate rotation {rotation}")));
            }
            let rotated = rotate_about_center(&upright, rotation, 255);
            entries.push(GlyphEntry {
                id: rotation.to_string(),
                rotation,
                mask: GlyphMask::from_image(&rotated),
            });
            log::debug!("rotation {rotation:>4} stored");
        }

        log::info!("Glyph palette complete: {} entries", entries.len());
        Ok(Self { character, tile_size, entries })
    }

    pub fn character(&self) -> char {
        self.character
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn entries(&self) -> &[GlyphEntry] {
        &self.entries
    }
}

/// Mean red, green and blue over every pixel of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSignature {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl ColorSignature {
    pub fn distance_sq(&self, other: &ColorSignature) -> f64 {
        let (dr, dg, db) = (self.r - other.r, self.g - other.g, self.b - other.b);
        dr * dr + dg * dg + db * db
    }
}

#[derive(Debug, Clone)]
pub struct ColorEntry {
    /// Source file name
    pub id: String,
    pub signature: ColorSignature,
    /// Tile-sized RGBA pixels pasted on a match
    pub image: RgbaImage,
}

/// A set of emoji images keyed by file name, sorted by name.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    tile_size: u32,
    entries: Vec<ColorEntry>,
}

impl ColorPalette {
    /// Decode every image file in `dir`. Files that fail to decode are skipped.
    pub fn build(dir: impl AsRef<Path>, tile_size: u32) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(MosaicError::Configuration(format!(
                "emoji directory {} does not exist",
                dir.display()
            )));
        }

        log::info!("Building emoji palette from {}...", dir.display());

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            match image::open(&path) {
                Ok(img) => images.push((name, img.to_rgba8())),
                Err(e) => log::warn!("skipping {}: {e}", path.display()),
            }
        }

        if images.is_empty() {
            return Err(MosaicError::Configuration(format!(
                "no decodable images in {}",
                dir.display()
            )));
        }

        Self::from_images(images, tile_size)
    }

    /// Build from already decoded images. Entries are ordered by id.
    pub fn from_images(images: Vec<(String, RgbaImage)>, tile_size: u32) -> Result<Self> {
        if tile_size == 0 {
            return Err(MosaicError::Shape("tile size must be greater than zero".into()));
        }
        if images.is_empty() {
            return Err(MosaicError::Configuration("emoji palette is empty".into()));
        }

        let mut entries: Vec<ColorEntry> = images
            .into_iter()
            .map(|(id, img)| {
                let signature = mean_rgb(&img);
                let image = if img.dimensions() == (tile_size, tile_size) {
                    img
                } else {
                    imageops::resize(&img, tile_size, tile_size, FilterType::Triangle)
                };
                log::debug!(
                    "{id}: mean rgb ({:.1}, {:.1}, {:.1})",
                    signature.r,
                    signature.g,
                    signature.b
                );
                ColorEntry { id, signature, image }
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));

        log::info!("Emoji palette complete: {} entries", entries.len());
        Ok(Self { tile_size, entries })
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn entries(&self) -> &[ColorEntry] {
        &self.entries
    }
}

/// A built palette of either kind.
#[derive(Debug, Clone)]
pub enum Palette {
    Glyph(GlyphPalette),
    Color(ColorPalette),
}

impl Palette {
    pub fn tile_size(&self) -> u32 {
        match self {
            Palette::Glyph(p) => p.tile_size(),
            Palette::Color(p) => p.tile_size(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Palette::Glyph(p) => p.entries().len(),
            Palette::Color(p) => p.entries().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry identifiers in palette order
    pub fn ids(&self) -> Vec<&str> {
        match self {
            Palette::Glyph(p) => p.entries().iter().map(|e| e.id.as_str()).collect(),
            Palette::Color(p) => p.entries().iter().map(|e| e.id.as_str()).collect(),
        }
    }
}

/// Build a palette from its configuration. The font or emoji directory is read here.
pub fn build_palette(config: &PaletteConfig) -> Result<Palette> {
    match config {
        PaletteConfig::Glyph(c) => {
            let glyphs = FontGlyphs::new(&c.font, c.font_size, c.origin)?;
            let palette = GlyphPalette::build(&glyphs, c.character, c.tile_size, &c.rotations)?;
            Ok(Palette::Glyph(palette))
        }
        PaletteConfig::Emoji(c) => Ok(Palette::Color(ColorPalette::build(&c.dir, c.tile_size)?)),
    }
}
