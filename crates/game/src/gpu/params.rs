//! GPU shader parameter structs for the grid passes.
//!
//! These are `#[repr(C)]` structs uploaded to uniform buffers. Layouts match
//! the WGSL declarations in `shaders/` field for field; each is a multiple
//! of 16 bytes.

use bytemuck::{Pod, Zeroable};
use cellsim::{BrushConfig, BrushPolicy, GridDims, PixelFormat, PixelLayout, Pointer, BOUNDARY_MARGIN};

/// Grid dimensions record (16 bytes). Shared by every pass.
///
/// Cells are two bytes, so a row of `width` cells is `width / 2` words.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub(crate) struct GridParams {
    pub width: u32,
    pub height: u32,
    pub words_per_row: u32,
    pub _pad: u32,
}

impl GridParams {
    pub fn new(dims: GridDims) -> Self {
        Self {
            width: dims.width(),
            height: dims.height(),
            words_per_row: dims.width() / 2,
            _pad: 0,
        }
    }
}

/// Brush stroke parameters (32 bytes).
///
/// The stroke square is clipped to the grid on the host, so the shader only
/// sees in-grid half-open ranges `[x0, x1) x [y0, y1)`. The dispatch covers
/// the words overlapping `[x0, x1)` on each row.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub(crate) struct InjectParams {
    pub x0: u32,
    pub x1: u32,
    pub y0: u32,
    pub y1: u32,
    pub buttons: u32,
    pub contain: u32,
    pub margin: u32,
    pub _pad: u32,
}

impl InjectParams {
    /// Clip the stroke under `pointer` to the grid. `None` when nothing
    /// would be touched.
    pub fn clip(pointer: &Pointer, brush: &BrushConfig, dims: GridDims) -> Option<Self> {
        if !pointer.buttons.any() {
            return None;
        }
        let r = brush.radius as i64;
        let (px, py) = (pointer.position.x as i64, pointer.position.y as i64);
        let x0 = (px - r).max(0);
        let x1 = (px + r).min(dims.width() as i64);
        let y0 = (py - r).max(0);
        let y1 = (py + r).min(dims.height() as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Self {
            x0: x0 as u32,
            x1: x1 as u32,
            y0: y0 as u32,
            y1: y1 as u32,
            buttons: pointer.buttons.bits(),
            contain: (brush.policy == BrushPolicy::Contain) as u32,
            margin: BOUNDARY_MARGIN,
            _pad: 0,
        })
    }

    #[inline]
    pub fn first_word(&self) -> u32 {
        self.x0 / 2
    }

    /// Number of words overlapping one clipped row.
    #[inline]
    pub fn words(&self) -> u32 {
        (self.x1 - 1) / 2 - self.first_word() + 1
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Render target description (16 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub(crate) struct RenderParams {
    pub pitch_words: u32,
    pub format: u32,
    pub _pad: [u32; 2],
}

impl RenderParams {
    pub fn new(layout: &PixelLayout) -> Self {
        Self {
            pitch_words: layout.pitch / 4,
            format: match layout.format {
                PixelFormat::Rgba8 => 0,
                PixelFormat::Bgra8 => 1,
            },
            _pad: [0; 2],
        }
    }
}
