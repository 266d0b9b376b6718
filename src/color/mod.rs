//! RGBA colors and the pure per-pixel arithmetic used by effects and merging
//!
//! Channels R, G, B are bytes; alpha is a float in [0, 1]. Every operation
//! saturates instead of wrapping. Float-to-byte conversion truncates toward
//! zero before clamping.

pub mod buffer;
pub mod selector;

pub use buffer::{clone_spliced, fill, resize_clone, scale_fill};
pub use selector::ColorSelector;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StripError};

/// A single pixel color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in [0, 1]; negative only for [`Color::NONE`]
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

impl Color {
    /// Reserved marker meaning "this layer contributes nothing here"
    pub const NONE: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: -1.0,
    };
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);

    /// Opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// True for the merge sentinel
    #[inline]
    pub fn is_none(&self) -> bool {
        self.a < 0.0
    }

    /// Alpha with the sentinel read as fully transparent
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.a.clamp(0.0, 1.0)
    }

    /// Parse `#rrggbb` / `rrggbb` (case-insensitive) into an opaque color
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StripError::construction(
                "hex color",
                format!("`{hex}` is not of the form #rrggbb"),
            ));
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self::rgb(r, g, b)),
            _ => Err(StripError::construction(
                "hex color",
                format!("`{hex}` is not of the form #rrggbb"),
            )),
        }
    }
}

/// Clamp a float into [lo, hi]
#[inline]
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Truncate toward zero, then saturate into a color channel
#[inline]
pub fn channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    clamp(value.trunc(), 0.0, 255.0) as u8
}

#[inline]
fn unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Scale the RGB channels (and optionally alpha) of a color
pub fn scalar_multiply(scalar: f64, color: Color, scale_alpha: bool) -> Color {
    let alpha = color.alpha();
    Color {
        r: channel(scalar * f64::from(color.r)),
        g: channel(scalar * f64::from(color.g)),
        b: channel(scalar * f64::from(color.b)),
        a: if scale_alpha {
            unit(scalar as f32 * alpha)
        } else {
            alpha
        },
    }
}

/// Saturating per-channel sum
pub fn add(c1: Color, c2: Color) -> Color {
    Color {
        r: c1.r.saturating_add(c2.r),
        g: c1.g.saturating_add(c2.g),
        b: c1.b.saturating_add(c2.b),
        a: unit(c1.alpha() + c2.alpha()),
    }
}

/// Per-channel arithmetic mean
pub fn blend(c1: Color, c2: Color) -> Color {
    Color {
        r: ((u16::from(c1.r) + u16::from(c2.r)) / 2) as u8,
        g: ((u16::from(c1.g) + u16::from(c2.g)) / 2) as u8,
        b: ((u16::from(c1.b) + u16::from(c2.b)) / 2) as u8,
        a: unit((c1.alpha() + c2.alpha()) / 2.0),
    }
}

/// Per-channel product normalized by 255
pub fn multiply(c1: Color, c2: Color) -> Color {
    let mul = |x: u8, y: u8| ((u16::from(x) * u16::from(y)) / 255) as u8;
    Color {
        r: mul(c1.r, c2.r),
        g: mul(c1.g, c2.g),
        b: mul(c1.b, c2.b),
        a: unit(c1.alpha() * c2.alpha()),
    }
}

/// Porter-Duff "over": `over` drawn on top of `under`
pub fn alpha_composite(under: Color, over: Color) -> Color {
    let a2 = f64::from(over.alpha());
    let a3 = f64::from(under.alpha()) * (1.0 - a2);
    let mix = |o: u8, u: u8| channel(a2 * f64::from(o) + a3 * f64::from(u));
    Color {
        r: mix(over.r, under.r),
        g: mix(over.g, under.g),
        b: mix(over.b, under.b),
        a: unit((a2 + a3) as f32),
    }
}

/// Linear interpolation between two colors, truncating channels
pub fn lerp(c1: Color, c2: Color, t: f64) -> Color {
    let mix = |x: u8, y: u8| channel(f64::from(x) + t * (f64::from(y) - f64::from(x)));
    Color {
        r: mix(c1.r, c2.r),
        g: mix(c1.g, c2.g),
        b: mix(c1.b, c2.b),
        a: unit((f64::from(c1.alpha()) + t * f64::from(c2.alpha() - c1.alpha())) as f32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_saturates() {
        let c = add(Color::rgb(200, 10, 0), Color::rgba(100, 10, 5, 0.5));
        assert_eq!(c, Color::rgb(255, 20, 5));
    }

    #[test]
    fn test_blend_and_multiply() {
        assert_eq!(
            blend(Color::rgb(255, 0, 10), Color::rgba(0, 0, 20, 0.0)),
            Color::rgba(127, 0, 15, 0.5)
        );
        assert_eq!(
            multiply(Color::rgb(255, 128, 0), Color::rgb(128, 255, 255)),
            Color::rgb(128, 128, 0)
        );
    }

    #[test]
    fn test_scalar_multiply() {
        let c = scalar_multiply(0.5, Color::rgb(255, 100, 3), true);
        assert_eq!(c, Color::rgba(127, 50, 1, 0.5));
        let c = scalar_multiply(2.0, Color::rgba(200, 1, 0, 0.25), false);
        assert_eq!(c, Color::rgba(255, 2, 0, 0.25));
    }

    #[test]
    fn test_alpha_composite() {
        // Opaque top replaces
        let c = alpha_composite(Color::RED, Color::BLUE);
        assert_eq!(c, Color::BLUE);
        // Transparent top leaves the bottom
        let c = alpha_composite(Color::RED, Color::TRANSPARENT);
        assert_eq!(c, Color::RED);
        // Half over opaque
        let c = alpha_composite(Color::BLACK, Color::rgba(200, 0, 0, 0.5));
        assert_eq!(c.r, 100);
        assert!((c.a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sentinel_reads_transparent() {
        assert!(Color::NONE.is_none());
        assert!(!Color::TRANSPARENT.is_none());
        assert_eq!(add(Color::NONE, Color::GREEN), Color::GREEN);
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#ff8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(Color::from_hex("0A0b0C").unwrap(), Color::rgb(10, 11, 12));
        assert!(Color::from_hex("#ff80").is_err());
        assert!(Color::from_hex("zzzzzz").is_err());
    }

    #[test]
    fn test_lerp_truncates() {
        let c = lerp(Color::rgb(255, 0, 0), Color::rgb(0, 0, 0), 0.5);
        assert_eq!(c.r, 127);
        assert_eq!(lerp(Color::RED, Color::BLUE, 1.0), Color::BLUE);
    }
}
