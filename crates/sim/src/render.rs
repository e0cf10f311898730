//! Grid to pixel mapping.
//!
//! One 32-bit pixel per cell, rows `pitch` bytes apart. Bytes between
//! `width * 4` and `pitch` are padding and are always written as zero, so
//! every render overwrites the whole target.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::error::ConfigurationError;
use crate::grid::GridDims;

pub const BYTES_PER_PIXEL: u32 = 4;

/// Largest row alignment a layout may pad to. Every `GridDims` fits a
/// pitch rounded up to this.
pub const MAX_ROW_ALIGNMENT: u32 = 256;

/// Byte order of a packed pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    #[default]
    Rgba8,
    Bgra8,
}

impl PixelFormat {
    #[inline]
    pub fn pack(self, rgb: [u8; 3]) -> [u8; 4] {
        let [r, g, b] = rgb;
        match self {
            PixelFormat::Rgba8 => [r, g, b, 255],
            PixelFormat::Bgra8 => [b, g, r, 255],
        }
    }
}

/// Size and row stride of a pixel target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelLayout {
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub format: PixelFormat,
}

impl PixelLayout {
    /// A layout with an explicit row pitch in bytes.
    pub fn new(dims: GridDims, pitch: u32, format: PixelFormat) -> Result<Self, ConfigurationError> {
        let min = dims.width() * BYTES_PER_PIXEL;
        if pitch < min {
            return Err(ConfigurationError::PitchTooSmall {
                width: dims.width(),
                pitch,
                min,
            });
        }
        if pitch % BYTES_PER_PIXEL != 0 {
            return Err(ConfigurationError::PitchUnaligned { pitch });
        }
        Ok(Self {
            width: dims.width(),
            height: dims.height(),
            pitch,
            format,
        })
    }

    /// A layout with rows padded up to a multiple of `align` bytes.
    /// `align` is clamped to `1..=MAX_ROW_ALIGNMENT`.
    pub fn aligned(dims: GridDims, align: u32, format: PixelFormat) -> Self {
        let align = align.clamp(1, MAX_ROW_ALIGNMENT);
        let row = dims.width() * BYTES_PER_PIXEL;
        let pitch = row.div_ceil(align) * align;
        Self {
            width: dims.width(),
            height: dims.height(),
            pitch,
            format,
        }
    }

    /// A layout with no row padding.
    pub fn tight(dims: GridDims, format: PixelFormat) -> Self {
        Self::aligned(dims, BYTES_PER_PIXEL, format)
    }

    /// Whether this layout covers exactly the cells of `dims`.
    #[inline]
    pub fn fits(&self, dims: GridDims) -> bool {
        (self.width, self.height) == (dims.width(), dims.height())
    }

    #[inline]
    pub fn byte_size(&self) -> usize {
        self.height as usize * self.pitch as usize
    }
}

/// Packed colour of a single cell.
#[inline]
pub fn cell_pixel(cell: Cell, format: PixelFormat) -> [u8; 4] {
    format.pack(cell.material().color(cell.intensity))
}

/// Write every pixel (and padding byte) of `pixels` from `cells`.
pub fn render(pixels: &mut [u8], cells: &[Cell], dims: GridDims, layout: &PixelLayout) {
    assert_eq!(cells.len(), dims.cell_count(), "cell buffer size mismatch");
    assert_eq!(pixels.len(), layout.byte_size(), "pixel buffer size mismatch");
    assert_eq!(
        (layout.width, layout.height),
        (dims.width(), dims.height()),
        "pixel layout does not match grid"
    );

    let w = dims.width() as usize;
    let row_bytes = w * BYTES_PER_PIXEL as usize;
    for (row, out) in cells
        .chunks_exact(w)
        .zip(pixels.chunks_exact_mut(layout.pitch as usize))
    {
        let (body, padding) = out.split_at_mut(row_bytes);
        for (cell, px) in row.iter().zip(body.chunks_exact_mut(4)) {
            px.copy_from_slice(&cell_pixel(*cell, layout.format));
        }
        padding.fill(0);
    }
}

/// Host-side pixel buffer sized for a layout.
pub struct PixelBuffer {
    layout: PixelLayout,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(layout: PixelLayout) -> Self {
        Self {
            layout,
            bytes: vec![0; layout.byte_size()],
        }
    }

    #[inline]
    pub fn layout(&self) -> &PixelLayout {
        &self.layout
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn render(&mut self, cells: &[Cell], dims: GridDims) {
        render(&mut self.bytes, cells, dims, &self.layout);
    }

    /// Pixel at `(x, y)` as stored, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.layout.width || y >= self.layout.height {
            return None;
        }
        let at = y as usize * self.layout.pitch as usize + x as usize * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.bytes[at..at + 4]);
        Some(px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;

    #[test]
    fn pitch_validation() {
        let dims = GridDims::new(10, 4).unwrap();
        assert!(PixelLayout::new(dims, 39, PixelFormat::Rgba8).is_err());
        assert!(PixelLayout::new(dims, 42, PixelFormat::Rgba8).is_err());
        assert_eq!(PixelLayout::new(dims, 44, PixelFormat::Rgba8).unwrap().byte_size(), 176);
    }

    #[test]
    fn aligned_pitch_rounds_up() {
        let dims = GridDims::new(100, 2).unwrap();
        assert_eq!(PixelLayout::aligned(dims, 256, PixelFormat::Rgba8).pitch, 512);
        let dims = GridDims::new(64, 2).unwrap();
        assert_eq!(PixelLayout::aligned(dims, 256, PixelFormat::Rgba8).pitch, 256);
        assert_eq!(PixelLayout::tight(dims, PixelFormat::Rgba8).pitch, 256);
    }

    #[test]
    fn widest_grid_gets_a_representable_pitch() {
        let dims = GridDims::new((1 << 30) - 64, 2).unwrap();
        let layout = PixelLayout::aligned(dims, MAX_ROW_ALIGNMENT, PixelFormat::Rgba8);
        assert_eq!(layout.pitch, u32::MAX - 255);
        assert_eq!(layout.byte_size(), 2 * (u32::MAX as usize - 255));
        // Larger alignments are clamped instead of overflowing
        assert_eq!(PixelLayout::aligned(dims, u32::MAX, PixelFormat::Rgba8).pitch, layout.pitch);
    }

    #[test]
    fn layout_fits_only_its_own_grid() {
        let dims = GridDims::new(64, 64).unwrap();
        let layout = PixelLayout::tight(dims, PixelFormat::Rgba8);
        assert!(layout.fits(dims));
        assert!(!layout.fits(GridDims::new(32, 32).unwrap()));
    }

    #[test]
    fn formats_swap_red_and_blue() {
        let wall = Cell::WALL;
        let src = Cell::SOURCE;
        assert_eq!(cell_pixel(wall, PixelFormat::Rgba8), [128, 128, 128, 255]);
        assert_eq!(cell_pixel(src, PixelFormat::Rgba8), [200, 230, 255, 255]);
        assert_eq!(cell_pixel(src, PixelFormat::Bgra8), [255, 230, 200, 255]);
    }

    #[test]
    fn render_overwrites_padding_and_is_idempotent() {
        let dims = GridDims::new(30, 24).unwrap();
        let layout = PixelLayout::aligned(dims, 256, PixelFormat::Bgra8);
        let mut cells = dims.initial_cells();
        cells[dims.index(15, 15).unwrap()] = Cell::new(Material::Empty, 128);

        let mut buf = PixelBuffer::new(layout);
        // Garbage from a previous frame
        buf.bytes.fill(0xEE);
        buf.render(&cells, dims);
        let first = buf.bytes().to_vec();
        buf.render(&cells, dims);
        assert_eq!(buf.bytes(), &first[..]);

        let row = &first[..layout.pitch as usize];
        assert!(row[120..].iter().all(|b| *b == 0));
        assert_eq!(buf.pixel(0, 0), Some(cell_pixel(Cell::WALL, PixelFormat::Bgra8)));
        assert_eq!(
            buf.pixel(15, 15),
            Some(cell_pixel(Cell::new(Material::Empty, 128), PixelFormat::Bgra8))
        );
        assert_eq!(buf.pixel(30, 0), None);
    }
}
