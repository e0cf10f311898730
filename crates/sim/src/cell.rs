//! Cell data structure - two bytes per grid position.

use bytemuck::{Pod, Zeroable};

use crate::material::Material;

/// A single cell in the simulation grid.
///
/// Layout is fixed (`material` then `intensity`) because buffers of cells are
/// copied verbatim into device memory, where the shaders read them as packed
/// little-endian 16-bit halves of a `u32`.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Hash, Pod, Zeroable)]
pub struct Cell {
    pub material: u8,
    pub intensity: u8,
}

impl Cell {
    pub const EMPTY: Cell = Cell::new(Material::Empty, 0);
    pub const WALL: Cell = Cell::new(Material::Wall, 0);
    pub const SOURCE: Cell = Cell::new(Material::Fluid, 255);

    #[inline]
    pub const fn new(material: Material, intensity: u8) -> Self {
        Self {
            material: material as u8,
            intensity,
        }
    }

    #[inline]
    pub const fn material(self) -> Material {
        Material::from_tag(self.material)
    }

    #[inline]
    pub const fn is_wall(self) -> bool {
        self.material == Material::Wall as u8
    }
}
