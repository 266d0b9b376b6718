//! Multi-child composites: contiguous bands and interpolated gradients

use super::{BoxedEffect, ChildEffect, Effect, EffectKind};
use crate::color::{Color, lerp};
use crate::error::{Result, StripError};

/// Partitions the strip into equal contiguous bands, one per child
#[derive(Debug)]
pub struct Split {
    children: Vec<ChildEffect>,
}

impl Split {
    pub fn new(effects: Vec<BoxedEffect>) -> Result<Self> {
        if effects.is_empty() {
            return Err(StripError::construction("split", "at least one effect is required"));
        }
        Ok(Self {
            children: effects.into_iter().map(ChildEffect::new).collect(),
        })
    }

    /// Half-open band `[left, right)` for child `k` of `n` on an `len`-pixel strip
    pub fn band(k: usize, n: usize, len: usize) -> (usize, usize) {
        let edge = |k: usize| (k * len).div_ceil(n);
        (edge(k), edge(k + 1))
    }
}

impl Effect for Split {
    fn kind(&self) -> EffectKind {
        EffectKind::combine(self.children.iter().map(ChildEffect::kind))
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        let n = self.children.len();
        let len = pixels.len();
        for (k, child) in self.children.iter_mut().enumerate() {
            let (left, right) = Split::band(k, n, len);
            let window = &mut pixels[left..right];
            let rendered = child.render(window, dt);
            window.copy_from_slice(rendered);
        }
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Self {
            children: self.children.iter().map(ChildEffect::clone_child).collect(),
        })
    }
}

/// Samples each child at evenly spaced rays and interpolates between them
#[derive(Debug)]
pub struct Gradient {
    children: Vec<ChildEffect>,
    weights: Vec<usize>,
}

impl Gradient {
    /// One ray per child
    pub fn new(effects: Vec<BoxedEffect>) -> Result<Self> {
        let weights = vec![1; effects.len()];
        Self::weighted(effects, weights)
    }

    /// `weights[k]` rays sampled from child `k`
    pub fn weighted(effects: Vec<BoxedEffect>, weights: Vec<usize>) -> Result<Self> {
        if effects.is_empty() {
            return Err(StripError::construction("gradient", "at least one effect is required"));
        }
        if weights.len() != effects.len() {
            return Err(StripError::construction(
                "gradient weights",
                format!(
                    "{} weights given for {} effects",
                    weights.len(),
                    effects.len()
                ),
            ));
        }
        if weights.contains(&0) {
            return Err(StripError::construction("gradient weights", "weights must be >= 1"));
        }
        Ok(Self {
            children: effects.into_iter().map(ChildEffect::new).collect(),
            weights,
        })
    }

    /// Concatenated ray colors, in child order
    fn rays(&mut self, pixels: &[Color], dt: f64) -> Vec<Color> {
        let n = pixels.len();
        let mut rays = Vec::with_capacity(self.weights.iter().sum());
        for (child, &weight) in self.children.iter_mut().zip(&self.weights) {
            let colors = child.render(pixels, dt);
            for j in 0..weight {
                let index = (j as f64 / weight as f64 * n as f64) as usize;
                rays.push(colors[index.min(n - 1)]);
            }
        }
        rays
    }
}

impl Effect for Gradient {
    fn kind(&self) -> EffectKind {
        EffectKind::combine(self.children.iter().map(ChildEffect::kind))
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        let n = pixels.len();
        if n == 0 {
            return;
        }
        let rays = self.rays(pixels, dt);
        let last = rays.len() - 1;
        for (i, pixel) in pixels.iter_mut().enumerate() {
            let value = if n == 1 {
                0.0
            } else {
                i as f64 / (n - 1) as f64
            };
            if last == 0 || value == 0.0 {
                *pixel = rays[0];
                continue;
            }
            let v = value * last as f64;
            // Left ray wins ties: j = ceil(v) - 1
            let j = ((v.ceil() as usize).saturating_sub(1)).min(last - 1);
            *pixel = lerp(rays[j], rays[j + 1], v - j as f64);
        }
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Self {
            children: self.children.iter().map(ChildEffect::clone_child).collect(),
            weights: self.weights.clone(),
        })
    }
}
