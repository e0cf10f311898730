//! Material tags and their rendering colours.
//!
//! A cell stores its material as a raw byte so the grid can be copied to and
//! from device memory untouched. `Material` is the typed view of that byte.

/// Material stored in a cell's tag byte.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[repr(u8)]
pub enum Material {
    #[default]
    Empty = 0,
    Fluid = 1, // Source substance - holds its intensity
    Wall = 2,  // Solid - never changed by the step rule
}

impl Material {
    /// Decode a raw tag. Unknown tags decode as `Empty`.
    #[inline]
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            1 => Material::Fluid,
            2 => Material::Wall,
            _ => Material::Empty,
        }
    }

    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Returns true if this material blocks diffusion and ignores intensity.
    #[inline]
    pub const fn is_solid(self) -> bool {
        matches!(self, Material::Wall)
    }

    /// Returns true if the step rule recomputes this cell's intensity.
    #[inline]
    pub const fn diffuses(self) -> bool {
        matches!(self, Material::Empty)
    }

    /// Colour at zero intensity.
    #[inline]
    pub const fn base_color(self) -> [u8; 3] {
        match self {
            Material::Empty => [20, 20, 30],    // Dark background
            Material::Fluid => [30, 100, 200],  // Water blue
            Material::Wall => [128, 128, 128],  // Gray
        }
    }

    /// Colour at full intensity. Walls do not vary.
    #[inline]
    pub const fn peak_color(self) -> [u8; 3] {
        match self {
            Material::Empty => [30, 100, 200],
            Material::Fluid => [200, 230, 255], // Foam
            Material::Wall => [128, 128, 128],
        }
    }

    /// RGB colour for this material at the given intensity.
    ///
    /// Integer blend `base + (peak - base) * intensity / 255` per channel, so
    /// the host renderer and the WGSL renderer agree bit for bit.
    #[inline]
    pub fn color(self, intensity: u8) -> [u8; 3] {
        let base = self.base_color();
        let peak = self.peak_color();
        let i = intensity as i32;
        let mut out = [0u8; 3];
        for c in 0..3 {
            let (b, p) = (base[c] as i32, peak[c] as i32);
            out[c] = (b + (p - b) * i / 255) as u8;
        }
        out
    }
}

impl From<Material> for u8 {
    fn from(material: Material) -> u8 {
        material.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for m in [Material::Empty, Material::Fluid, Material::Wall] {
            assert_eq!(Material::from_tag(m.tag()), m);
        }
        assert_eq!(Material::Wall.tag(), 2);
    }

    #[test]
    fn unknown_tags_are_empty() {
        assert_eq!(Material::from_tag(3), Material::Empty);
        assert_eq!(Material::from_tag(255), Material::Empty);
    }

    #[test]
    fn color_endpoints() {
        assert_eq!(Material::Empty.color(0), [20, 20, 30]);
        assert_eq!(Material::Empty.color(255), [30, 100, 200]);
        assert_eq!(Material::Fluid.color(255), [200, 230, 255]);
        // Walls ignore intensity
        assert_eq!(Material::Wall.color(0), Material::Wall.color(200));
    }

    #[test]
    fn color_is_monotonic_for_empty() {
        let mut last = Material::Empty.color(0);
        for i in 1..=255u8 {
            let c = Material::Empty.color(i);
            assert!(c[2] >= last[2]);
            last = c;
        }
    }
}
