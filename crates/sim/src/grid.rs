//! Grid dimensions, bounds-checked indexing and the host grid state.
//!
//! Cells are stored row-major with stride = width. `GridDims` is the only
//! place that turns 2D coordinates into linear offsets, and it never hands
//! out an offset outside `[0, width * height)`.

use glam::IVec2;

use crate::cell::Cell;
use crate::error::{BoundsError, ConfigurationError};
use crate::render::{BYTES_PER_PIXEL, MAX_ROW_ALIGNMENT};

/// Width of the wall band laid down around the grid at initialization.
/// Matches the default brush radius.
pub const BOUNDARY_MARGIN: u32 = 10;

/// Cells with `x < SEED_EXTENT && y < SEED_EXTENT` (outside the wall band)
/// start as full-intensity fluid.
pub const SEED_EXTENT: u32 = 40;

/// Validated grid dimensions. Both sides are positive and even, and the
/// cell buffer and a pixel target padded to [`MAX_ROW_ALIGNMENT`] are
/// addressable in host memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridDims {
    width: u32,
    height: u32,
}

impl GridDims {
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigurationError> {
        if width == 0 || height == 0 {
            return Err(ConfigurationError::NonPositive { width, height });
        }
        if width % 2 != 0 || height % 2 != 0 {
            return Err(ConfigurationError::Odd { width, height });
        }
        if !Self::addressable(width, height) {
            return Err(ConfigurationError::TooLarge { width, height });
        }
        Ok(Self { width, height })
    }

    fn addressable(width: u32, height: u32) -> bool {
        let fits = |bytes: Option<u64>| bytes.is_some_and(|b| usize::try_from(b).is_ok());
        let pitch =
            (width as u64 * BYTES_PER_PIXEL as u64).next_multiple_of(MAX_ROW_ALIGNMENT as u64);
        let cells = width as u64 * height as u64;
        pitch <= u32::MAX as u64
            && fits(cells.checked_mul(std::mem::size_of::<Cell>() as u64))
            && fits(pitch.checked_mul(height as u64))
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub const fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of one cell buffer in bytes.
    #[inline]
    pub const fn byte_size(&self) -> u64 {
        (self.cell_count() * std::mem::size_of::<Cell>()) as u64
    }

    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Linear offset of `(x, y)`, or `None` if it lies outside the grid.
    #[inline]
    pub fn index(&self, x: i64, y: i64) -> Option<usize> {
        if self.contains(x, y) {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Linear offset of `(x, y)`, reporting the coordinate on failure.
    pub fn try_index(&self, x: i64, y: i64) -> Result<usize, BoundsError> {
        self.index(x, y).ok_or(BoundsError {
            x,
            y,
            width: self.width,
            height: self.height,
        })
    }

    #[inline]
    pub fn index_of(&self, pos: IVec2) -> Option<usize> {
        self.index(pos.x as i64, pos.y as i64)
    }

    /// Inverse of [`GridDims::index`].
    #[inline]
    pub fn coords(&self, index: usize) -> (u32, u32) {
        debug_assert!(index < self.cell_count());
        let w = self.width as usize;
        ((index % w) as u32, (index / w) as u32)
    }

    /// True for cells inside the wall band of width [`BOUNDARY_MARGIN`].
    #[inline]
    pub fn in_boundary(&self, x: u32, y: u32) -> bool {
        x < BOUNDARY_MARGIN
            || y < BOUNDARY_MARGIN
            || x >= self.width.saturating_sub(BOUNDARY_MARGIN)
            || y >= self.height.saturating_sub(BOUNDARY_MARGIN)
    }

    /// Initial value of the cell at `(x, y)`.
    pub fn initial_cell(&self, x: u32, y: u32) -> Cell {
        if self.in_boundary(x, y) {
            Cell::WALL
        } else if x < SEED_EXTENT && y < SEED_EXTENT {
            Cell::SOURCE
        } else {
            Cell::EMPTY
        }
    }

    /// Fill `cells` with the initial layout.
    pub fn write_initial(&self, cells: &mut [Cell]) {
        assert_eq!(cells.len(), self.cell_count(), "cell buffer size mismatch");
        for (i, cell) in cells.iter_mut().enumerate() {
            let (x, y) = self.coords(i);
            *cell = self.initial_cell(x, y);
        }
    }

    /// The initial layout as a fresh buffer.
    pub fn initial_cells(&self) -> Vec<Cell> {
        let mut cells = vec![Cell::EMPTY; self.cell_count()];
        self.write_initial(&mut cells);
        cells
    }
}

/// Double-buffered grid state in host memory.
///
/// `current` is what injection and rendering observe; `next` is scratch that
/// only the step writes. `swap` exchanges the two in O(1).
pub struct HostGrid {
    dims: GridDims,
    current: Vec<Cell>,
    next: Vec<Cell>,
}

impl HostGrid {
    /// Allocate both buffers, zero-filled.
    pub fn create(dims: GridDims) -> Self {
        Self {
            dims,
            current: vec![Cell::EMPTY; dims.cell_count()],
            next: vec![Cell::EMPTY; dims.cell_count()],
        }
    }

    /// Allocate and lay down the initial wall band and seed region.
    pub fn new(dims: GridDims) -> Self {
        let mut grid = Self::create(dims);
        grid.initialize();
        grid
    }

    pub fn initialize(&mut self) {
        self.dims.write_initial(&mut self.current);
        self.next.fill(Cell::EMPTY);
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn current(&self) -> &[Cell] {
        &self.current
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut [Cell] {
        &mut self.current
    }

    #[inline]
    pub fn next(&self) -> &[Cell] {
        &self.next
    }

    /// Borrow current read-only and next writable at the same time.
    #[inline]
    pub fn split(&mut self) -> (&[Cell], &mut [Cell]) {
        (&self.current, &mut self.next)
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    pub fn get(&self, x: i64, y: i64) -> Option<Cell> {
        self.dims.index(x, y).map(|i| self.current[i])
    }

    pub fn set(&mut self, x: i64, y: i64, cell: Cell) -> Result<(), BoundsError> {
        let i = self.dims.try_index(x, y)?;
        self.current[i] = cell;
        Ok(())
    }
}
