//! Color values
//!
//! Colors travel through the effect props as packed `0xRRGGBBAA` integers
//! (the form a declarative scene description stores them in) and reach the
//! GPU as normalized `[r, g, b, a]` floats.

use serde::{Deserialize, Serialize};

/// A color packed as `0xRRGGBBAA`
pub type PackedColor = u32;

/// Convert a packed `0xRRGGBBAA` color to normalized `[r, g, b, a]`
///
/// Each channel maps linearly as `channel / 255`, so `0x00` is exactly `0.0`
/// and `0xff` is exactly `1.0`. Channel order is preserved.
#[inline]
pub fn normalize_rgba(packed: PackedColor) -> [f32; 4] {
    [
        ((packed >> 24) & 0xff) as f32 / 255.0,
        ((packed >> 16) & 0xff) as f32 / 255.0,
        ((packed >> 8) & 0xff) as f32 / 255.0,
        (packed & 0xff) as f32 / 255.0,
    ]
}

/// RGBA color (linear space, straight alpha)
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from a packed `0xRRGGBBAA` value
    pub fn from_packed(packed: PackedColor) -> Self {
        Self::from_array(normalize_rgba(packed))
    }

    /// Pack into `0xRRGGBBAA`, rounding each channel to the nearest 8-bit value
    pub fn to_packed(&self) -> PackedColor {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 24) | (channel(self.g) << 16) | (channel(self.b) << 8) | channel(self.a)
    }

    pub const fn from_array(c: [f32; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Component-wise multiplication (tinting)
    pub fn modulate(&self, other: &Color) -> Color {
        Color {
            r: self.r * other.r,
            g: self.g * other.g,
            b: self.b * other.b,
            a: self.a * other.a,
        }
    }

    /// Scale every component, alpha included
    pub fn scale(&self, factor: f32) -> Color {
        Color {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: self.a * factor,
        }
    }

    /// Linear interpolation between two colors (`mix` in shader terms)
    pub fn lerp(a: &Color, b: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
            a: a.a + (b.a - a.a) * t,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<PackedColor> for Color {
    fn from(packed: PackedColor) -> Self {
        Self::from_packed(packed)
    }
}

impl From<[f32; 4]> for Color {
    fn from(c: [f32; 4]) -> Self {
        Self::from_array(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoints() {
        assert_eq!(normalize_rgba(0x00000000), [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(normalize_rgba(0xffffffff), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_normalize_channel_order() {
        let c = normalize_rgba(0x11223344);
        assert_eq!(c[0], 0x11 as f32 / 255.0);
        assert_eq!(c[1], 0x22 as f32 / 255.0);
        assert_eq!(c[2], 0x33 as f32 / 255.0);
        assert_eq!(c[3], 0x44 as f32 / 255.0);
    }

    #[test]
    fn test_normalize_is_injective_per_channel() {
        let mut previous = -1.0;
        for channel in 0..=255u32 {
            let value = normalize_rgba(channel)[3];
            assert!(value > previous);
            assert!((0.0..=1.0).contains(&value));
            previous = value;
        }
    }

    #[test]
    fn test_packed_roundtrip_through_color() {
        for packed in [0x00000000, 0xff0000ff, 0x12345678, 0xffffffff, 0x80808080] {
            assert_eq!(Color::from_packed(packed).to_packed(), packed);
        }
    }

    #[test]
    fn test_lerp_clamps() {
        let c = Color::lerp(&Color::BLACK, &Color::WHITE, 2.0);
        assert_eq!(c, Color::WHITE);
    }
}
