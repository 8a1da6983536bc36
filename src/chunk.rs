//! Image chunking - splits an image into square tiles for palette matching.

use crate::{MosaicError, Result};
use image::{imageops, ImageBuffer, Pixel};

/// A tile_size × tile_size block cut from the input image.
#[derive(Debug, Clone)]
pub struct InputTile<P: Pixel> {
    /// Left edge in input pixel coordinates
    pub x: u32,
    /// Top edge in input pixel coordinates
    pub y: u32,
    pub pixels: ImageBuffer<P, Vec<P::Subpixel>>,
}

pub struct ImageChunker<'a, P: Pixel> {
    image: &'a ImageBuffer<P, Vec<P::Subpixel>>,
    tile_size: u32,
    cols: u32,
    rows: u32,
}

impl<'a, P> ImageChunker<'a, P>
where
    P: Pixel + 'static,
{
    /// Partial tiles on the right and bottom edges are dropped, never padded.
    pub fn new(image: &'a ImageBuffer<P, Vec<P::Subpixel>>, tile_size: u32) -> Result<Self> {
        if tile_size == 0 {
            return Err(MosaicError::Shape("tile size must be greater than zero".into()));
        }
        Ok(Self {
            image,
            tile_size,
            cols: image.width() / tile_size,
            rows: image.height() / tile_size,
        })
    }

    /// Grid size as (columns, rows)
    pub fn grid(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// Largest tile multiples not exceeding the image dimensions
    pub fn usable_dimensions(&self) -> (u32, u32) {
        (self.cols * self.tile_size, self.rows * self.tile_size)
    }

    /// True when tile_size exceeds a dimension and no full tile fits.
    pub fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }

    /// Extract the tile at grid cell (col, row)
    pub fn get_chunk(&self, col: u32, row: u32) -> InputTile<P> {
        let (x, y) = (col * self.tile_size, row * self.tile_size);
        let size = self.tile_size;
        let pixels = imageops::crop_imm(self.image, x, y, size, size).to_image();
        InputTile { x, y, pixels }
    }

    /// All full tiles in row-major order.
    pub fn tiles(&self) -> Vec<InputTile<P>> {
        let mut tiles = Vec::with_capacity(tile_count(self.cols, self.rows));
        for row in 0..self.rows {
            for col in 0..self.cols {
                tiles.push(self.get_chunk(col, row));
            }
        }
        tiles
    }
}

fn tile_count(cols: u32, rows: u32) -> usize {
    cols as usize * rows as usize
}

/// Convenience wrapper over [`ImageChunker::tiles`].
pub fn extract<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    tile_size: u32,
) -> Result<Vec<InputTile<P>>>
where
    P: Pixel + 'static,
{
    Ok(ImageChunker::new(image, tile_size)?.tiles())
}
