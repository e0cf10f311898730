//! Pointer-driven edits of the current grid.
//!
//! A stroke covers the square `[x - r, x + r) x [y - r, y + r)` around the
//! pointer. Each held button maps to one [`BrushAction`]; actions are applied
//! in [`BrushAction::ORDER`], so when buttons are combined the later action
//! wins on the field both touch.
//!
//! Every candidate cell goes through [`GridDims::index`]; cells that fall
//! outside the grid are skipped, so a pointer anywhere (including far off
//! the grid) is safe.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::grid::GridDims;
use crate::material::Material;

/// Default brush radius. A stroke covers `2r x 2r` cells.
pub const DEFAULT_BRUSH_RADIUS: u32 = 10;

/// Which pointer buttons are held. Any combination is allowed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ButtonMask {
    pub primary: bool,
    pub secondary: bool,
    pub tertiary: bool,
}

impl ButtonMask {
    pub const NONE: ButtonMask = ButtonMask {
        primary: false,
        secondary: false,
        tertiary: false,
    };
    pub const PRIMARY: ButtonMask = ButtonMask {
        primary: true,
        ..Self::NONE
    };
    pub const SECONDARY: ButtonMask = ButtonMask {
        secondary: true,
        ..Self::NONE
    };
    pub const TERTIARY: ButtonMask = ButtonMask {
        tertiary: true,
        ..Self::NONE
    };

    #[inline]
    pub fn any(self) -> bool {
        self.primary || self.secondary || self.tertiary
    }

    #[inline]
    pub fn holds(self, action: BrushAction) -> bool {
        match action {
            BrushAction::AddSubstance => self.primary,
            BrushAction::AddWall => self.secondary,
            BrushAction::Erase => self.tertiary,
        }
    }

    /// Bit layout shared with the inject shader: primary = 1, secondary = 2,
    /// tertiary = 4.
    #[inline]
    pub fn bits(self) -> u32 {
        (self.primary as u32) | (self.secondary as u32) << 1 | (self.tertiary as u32) << 2
    }

    #[inline]
    pub fn from_bits(bits: u32) -> Self {
        Self {
            primary: bits & 1 != 0,
            secondary: bits & 2 != 0,
            tertiary: bits & 4 != 0,
        }
    }
}

/// Pointer position in grid coordinates plus held buttons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pointer {
    pub position: IVec2,
    pub buttons: ButtonMask,
}

impl Pointer {
    pub fn new(x: i32, y: i32, buttons: ButtonMask) -> Self {
        Self {
            position: IVec2::new(x, y),
            buttons,
        }
    }
}

/// One edit applied by a held button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrushAction {
    /// Primary button: `intensity = 255`, material unchanged.
    AddSubstance,
    /// Secondary button: `material = Wall`, intensity unchanged.
    AddWall,
    /// Tertiary button: `material = Empty`, intensity unchanged.
    Erase,
}

impl BrushAction {
    /// Application order. Secondary overrides tertiary overrides primary.
    pub const ORDER: [BrushAction; 3] = [
        BrushAction::AddSubstance,
        BrushAction::Erase,
        BrushAction::AddWall,
    ];

    #[inline]
    pub fn apply(self, cell: &mut Cell) {
        match self {
            BrushAction::AddSubstance => cell.intensity = 255,
            BrushAction::AddWall => cell.material = Material::Wall.tag(),
            BrushAction::Erase => cell.material = Material::Empty.tag(),
        }
    }
}

/// Whether strokes may touch the wall band laid down at initialization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushPolicy {
    /// Strokes edit any in-grid cell, including the wall band.
    #[default]
    Breach,
    /// Strokes skip cells inside the wall band.
    Contain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    pub radius: u32,
    pub policy: BrushPolicy,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_BRUSH_RADIUS,
            policy: BrushPolicy::Breach,
        }
    }
}

impl BrushConfig {
    /// In-grid linear offsets covered by a stroke at `center`, honouring the
    /// boundary policy. Row-major order.
    pub fn footprint(&self, dims: GridDims, center: IVec2) -> impl Iterator<Item = usize> + '_ {
        let r = self.radius as i64;
        let (cx, cy) = (center.x as i64, center.y as i64);
        let policy = self.policy;
        // Clipped to the grid before iterating
        let xs = (cx - r).max(0)..(cx + r).min(dims.width() as i64);
        let ys = (cy - r).max(0)..(cy + r).min(dims.height() as i64);
        ys.flat_map(move |y| {
            xs.clone().filter_map(move |x| {
                let index = dims.index(x, y)?;
                if policy == BrushPolicy::Contain && dims.in_boundary(x as u32, y as u32) {
                    return None;
                }
                Some(index)
            })
        })
    }

    /// Apply the pointer's held buttons to `cells`.
    ///
    /// Returns the number of cells touched (0 when no button is held).
    pub fn apply(&self, cells: &mut [Cell], dims: GridDims, pointer: &Pointer) -> usize {
        assert_eq!(cells.len(), dims.cell_count(), "cell buffer size mismatch");
        if !pointer.buttons.any() {
            return 0;
        }
        let mut touched = 0;
        for index in self.footprint(dims, pointer.position) {
            let cell = &mut cells[index];
            for action in BrushAction::ORDER {
                if pointer.buttons.holds(action) {
                    action.apply(cell);
                }
            }
            touched += 1;
        }
        touched
    }
}
