//! Color mapping and coordinate transforms.

use crate::types::{Rgb, COORD_MASK};

/// Intensity at which the emission switches from green afterglow to the
/// brighter blue-white flash.
const FLASH_LEVEL: u8 = 0x80;

/// Map a final 8-bit intensity to an output color.
///
/// Outside the visible area the output is always black. Dim intensities
/// render as a green glow with a faint red tint; bright intensities gain a
/// blue component to model the cooler initial emission of the phosphor.
#[inline]
pub fn phosphor_color(v: u8, visible: bool) -> Rgb {
    if !visible {
        return Rgb::BLACK;
    }
    if v < FLASH_LEVEL {
        Rgb::new(v >> 5, v, v >> 7)
    } else {
        Rgb::new(v >> 6, v, v)
    }
}

/// Maps host coordinates into ring space and raster positions into display
/// space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinateTransform {
    /// Raster column of display column 0.
    pub h_offset: u16,
    /// Raster row of display row 0.
    pub v_offset: u16,
    /// Host y grows upwards; raster rows grow downwards.
    pub flip_y: bool,
}

impl CoordinateTransform {
    /// Transform for a display window at raster `(h_offset, v_offset)`.
    pub fn new(h_offset: u16, v_offset: u16, flip_y: bool) -> Self {
        Self {
            h_offset,
            v_offset,
            flip_y,
        }
    }

    /// Host coordinates to the display coordinates stored in the ring.
    #[inline]
    pub fn host_to_display(&self, x: u16, y: u16) -> (u16, u16) {
        let x = x & COORD_MASK;
        let y = y & COORD_MASK;
        if self.flip_y {
            (x, COORD_MASK - y)
        } else {
            (x, y)
        }
    }

    /// Raster column to display column (negative left of the display).
    #[inline]
    pub fn display_x(&self, h: u16) -> i32 {
        h as i32 - self.h_offset as i32
    }

    /// Raster row to display row (negative above the display).
    #[inline]
    pub fn display_y(&self, v: u16) -> i32 {
        v as i32 - self.v_offset as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invisible_is_black() {
        for v in [0u8, 1, 0x7F, 0x80, 0xFF] {
            assert_eq!(phosphor_color(v, false), Rgb::BLACK);
        }
    }

    #[test]
    fn test_dim_is_green() {
        assert_eq!(phosphor_color(0, true), Rgb::BLACK);
        assert_eq!(phosphor_color(0x40, true), Rgb::new(2, 0x40, 0));
        assert_eq!(phosphor_color(0x7F, true), Rgb::new(3, 0x7F, 0));
    }

    #[test]
    fn test_bright_shifts_blue_white() {
        assert_eq!(phosphor_color(0x80, true), Rgb::new(2, 0x80, 0x80));
        assert_eq!(phosphor_color(0xFF, true), Rgb::new(3, 0xFF, 0xFF));
    }

    #[test]
    fn test_green_dominates() {
        for v in 0..=255u8 {
            let c = phosphor_color(v, true);
            assert!(c.g >= c.r && c.g >= c.b);
        }
    }

    #[test]
    fn test_host_to_display() {
        let t = CoordinateTransform::new(0, 0, false);
        assert_eq!(t.host_to_display(1025, 3), (1, 3));
        let t = CoordinateTransform::new(0, 0, true);
        assert_eq!(t.host_to_display(5, 0), (5, 1023));
        assert_eq!(t.host_to_display(5, 1023), (5, 0));
    }

    #[test]
    fn test_raster_to_display() {
        let t = CoordinateTransform::new(128, 4, false);
        assert_eq!(t.display_x(128), 0);
        assert_eq!(t.display_x(0), -128);
        assert_eq!(t.display_y(3), -1);
    }
}
