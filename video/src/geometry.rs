//! Display geometry reported by a VGA controller

use core::fmt;

/// Resolution in pixels (pixel controller) or cells (character controller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayGeometry {
    pub width: u32,
    pub height: u32,
}

impl DisplayGeometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Decode the packed resolution register (width low, height high)
    pub const fn from_packed(raw: u32) -> Self {
        Self {
            width: raw & 0xFFFF,
            height: (raw >> 16) & 0xFFFF,
        }
    }

    /// Encode into the packed register layout
    pub const fn packed(&self) -> u32 {
        (self.width & 0xFFFF) | ((self.height & 0xFFFF) << 16)
    }

    /// True when `(x, y)` lies in `[0, width) x [0, height)`
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for DisplayGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reference_resolution() {
        let g = DisplayGeometry::from_packed(0x00F0_0140);
        assert_eq!(g, DisplayGeometry::new(320, 240));
        assert_eq!(g.packed(), 0x00F0_0140);
    }

    #[test]
    fn test_zero_register_is_empty_geometry() {
        let g = DisplayGeometry::from_packed(0);
        assert_eq!(g, DisplayGeometry::new(0, 0));
        assert!(g.is_empty());
        assert!(!g.contains(0, 0));
    }

    #[test]
    fn test_contains_edges() {
        let g = DisplayGeometry::new(80, 60);
        assert!(g.contains(0, 0));
        assert!(g.contains(79, 59));
        assert!(!g.contains(80, 59));
        assert!(!g.contains(79, 60));
        assert!(!g.contains(-1, 0));
    }
}
