//! Position-to-color mappings used by fill effects

use serde::{Deserialize, Serialize};

use super::Color;
use crate::error::{Result, StripError};

/// Maps a normalized strip position in [0, 1) to a color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColorSelector {
    /// One color everywhere
    Solid(Color),
    /// Red → green → blue → red hue wheel
    Rainbow,
    /// Equal-width bands; a value exactly on a boundary belongs to the lower band
    Bands(Vec<Color>),
}

impl ColorSelector {
    /// Build a band selector, rejecting an empty palette
    pub fn bands(colors: Vec<Color>) -> Result<Self> {
        if colors.is_empty() {
            return Err(StripError::construction("bands", "at least one color is required"));
        }
        Ok(Self::Bands(colors))
    }

    pub fn color_at(&self, value: f64) -> Color {
        match self {
            ColorSelector::Solid(color) => *color,
            ColorSelector::Rainbow => rainbow(value),
            ColorSelector::Bands(colors) => {
                let n = colors.len();
                if value <= 0.0 {
                    return colors[0];
                }
                // Boundaries resolve downward: ceil(v * n) - 1
                let index = ((value * n as f64).ceil() as usize).saturating_sub(1);
                colors[index.min(n - 1)]
            }
        }
    }
}

/// Hue wheel over three segments
pub fn rainbow(value: f64) -> Color {
    let v = (value * 3.0).rem_euclid(3.0);
    let f = v.fract();
    let up = (255.0 * f) as u8;
    let down = (255.0 * (1.0 - f)) as u8;
    if v < 1.0 {
        Color::rgb(down, up, 0)
    } else if v < 2.0 {
        Color::rgb(0, down, up)
    } else {
        Color::rgb(up, 0, down)
    }
}
