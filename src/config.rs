//! Palette configuration, loadable from JSON.

use crate::glyph::{DEFAULT_FONT_SIZE, DEFAULT_ORIGIN};
use crate::{MosaicError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ROTATIONS: [f32; 5] = [-30.0, -15.0, 0.0, 15.0, 30.0];
pub const DEFAULT_GLYPH_TILE_SIZE: u32 = 64;
/// Emoji PNGs are 72×72
pub const DEFAULT_EMOJI_TILE_SIZE: u32 = 72;

/// Which palette to build, tagged by `"mode"` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PaletteConfig {
    Glyph(GlyphConfig),
    Emoji(EmojiConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphConfig {
    pub character: char,
    #[serde(default = "default_glyph_tile_size")]
    pub tile_size: u32,
    #[serde(default = "default_rotations")]
    pub rotations: Vec<f32>,
    /// TrueType/OpenType font file
    pub font: PathBuf,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_origin")]
    pub origin: (i32, i32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmojiConfig {
    /// Directory of candidate images
    pub dir: PathBuf,
    #[serde(default = "default_emoji_tile_size")]
    pub tile_size: u32,
}

/// What to do with input dimensions that are not tile multiples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Fit {
    /// Drop the right and bottom remainder strips
    #[default]
    Crop,
    /// Resample the whole image down to the nearest tile multiple
    Stretch,
}

fn default_glyph_tile_size() -> u32 {
    DEFAULT_GLYPH_TILE_SIZE
}

fn default_emoji_tile_size() -> u32 {
    DEFAULT_EMOJI_TILE_SIZE
}

fn default_rotations() -> Vec<f32> {
    DEFAULT_ROTATIONS.to_vec()
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_origin() -> (i32, i32) {
    DEFAULT_ORIGIN
}

impl GlyphConfig {
    pub fn new(character: char, font: impl Into<PathBuf>) -> Self {
        Self {
            character,
            tile_size: DEFAULT_GLYPH_TILE_SIZE,
            rotations: default_rotations(),
            font: font.into(),
            font_size: DEFAULT_FONT_SIZE,
            origin: DEFAULT_ORIGIN,
        }
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_rotations(mut self, rotations: Vec<f32>) -> Self {
        self.rotations = rotations;
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }
}

impl EmojiConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), tile_size: DEFAULT_EMOJI_TILE_SIZE }
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }
}

impl PaletteConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| MosaicError::Configuration(format!("invalid palette config: {e}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            MosaicError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn tile_size(&self) -> u32 {
        match self {
            PaletteConfig::Glyph(c) => c.tile_size,
            PaletteConfig::Emoji(c) => c.tile_size,
        }
    }
}
