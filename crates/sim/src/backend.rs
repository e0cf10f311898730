//! Backend abstraction over where the grid lives.
//!
//! A backend owns the double-buffered grid state, the pixel target, and the
//! components that act on them (brush, step, renderer). The frame driver only
//! sequences calls; it never touches cell memory directly.

use crate::brush::{BrushConfig, Pointer};
use crate::error::{ConfigurationError, SimResult};
use crate::grid::{GridDims, HostGrid};
use crate::render::{PixelBuffer, PixelLayout};
use crate::update;

/// Grid state plus the operations the frame driver sequences.
///
/// Call order within a frame is `inject`, then `step` + `swap` pairs, then
/// `render`. Implementations may queue work instead of completing it
/// immediately, but each call must observe the results of all calls made
/// before it.
pub trait GridBackend {
    fn dims(&self) -> GridDims;

    fn pixel_layout(&self) -> PixelLayout;

    /// Apply a pointer stroke to the current buffer.
    fn inject(&mut self, pointer: &Pointer, brush: &BrushConfig) -> SimResult<()>;

    /// Compute next from current. Current is left untouched.
    fn step(&mut self) -> SimResult<()>;

    /// Exchange the roles of current and next.
    fn swap(&mut self);

    /// Write the current buffer into the pixel target.
    fn render(&mut self) -> SimResult<()>;

    /// Block until every queued operation has completed.
    fn finish(&mut self) -> SimResult<()> {
        Ok(())
    }
}

/// Reference backend running the whole pipeline in host memory.
pub struct HostBackend {
    grid: HostGrid,
    pixels: PixelBuffer,
}

impl HostBackend {
    /// Creates and initializes the grid. `layout` must cover exactly `dims`.
    pub fn new(dims: GridDims, layout: PixelLayout) -> Result<Self, ConfigurationError> {
        if !layout.fits(dims) {
            return Err(ConfigurationError::LayoutMismatch {
                layout_width: layout.width,
                layout_height: layout.height,
                width: dims.width(),
                height: dims.height(),
            });
        }
        Ok(Self {
            grid: HostGrid::new(dims),
            pixels: PixelBuffer::new(layout),
        })
    }

    #[inline]
    pub fn grid(&self) -> &HostGrid {
        &self.grid
    }

    #[inline]
    pub fn grid_mut(&mut self) -> &mut HostGrid {
        &mut self.grid
    }

    #[inline]
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }
}

impl GridBackend for HostBackend {
    fn dims(&self) -> GridDims {
        self.grid.dims()
    }

    fn pixel_layout(&self) -> PixelLayout {
        *self.pixels.layout()
    }

    fn inject(&mut self, pointer: &Pointer, brush: &BrushConfig) -> SimResult<()> {
        let dims = self.grid.dims();
        brush.apply(self.grid.current_mut(), dims, pointer);
        Ok(())
    }

    fn step(&mut self) -> SimResult<()> {
        let dims = self.grid.dims();
        let (current, next) = self.grid.split();
        update::step(current, next, dims);
        Ok(())
    }

    fn swap(&mut self) {
        self.grid.swap();
    }

    fn render(&mut self) -> SimResult<()> {
        let dims = self.grid.dims();
        self.pixels.render(self.grid.current(), dims);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{BrushPolicy, ButtonMask};
    use crate::render::PixelFormat;

    #[test]
    fn layout_for_other_grid_is_rejected() {
        let dims = GridDims::new(64, 64).unwrap();
        let small = PixelLayout::tight(GridDims::new(32, 32).unwrap(), PixelFormat::Rgba8);
        assert_eq!(
            HostBackend::new(dims, small).err(),
            Some(ConfigurationError::LayoutMismatch {
                layout_width: 32,
                layout_height: 32,
                width: 64,
                height: 64,
            })
        );
    }

    #[test]
    fn matching_layout_renders() {
        let dims = GridDims::new(64, 64).unwrap();
        let layout = PixelLayout::aligned(dims, 256, PixelFormat::Bgra8);
        let mut backend = HostBackend::new(dims, layout).unwrap();
        backend.render().unwrap();
        assert_eq!(backend.pixels().bytes().len(), layout.byte_size());
    }

    #[test]
    fn huge_brush_stroke_is_bounded_by_grid() {
        let dims = GridDims::new(64, 64).unwrap();
        let mut backend = HostBackend::new(dims, PixelLayout::tight(dims, PixelFormat::Rgba8)).unwrap();
        let brush = BrushConfig {
            radius: u32::MAX,
            policy: BrushPolicy::Contain,
        };
        backend
            .inject(&Pointer::new(32, 32, ButtonMask::PRIMARY), &brush)
            .unwrap();
        let lit = backend.grid().current().iter().filter(|c| c.intensity == 255).count();
        assert_eq!(lit, 44 * 44);
    }
}
