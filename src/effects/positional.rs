//! Positional transforms: circular crop windows, resampling and alpha rescaling

use super::{BoxedEffect, ChildEffect, Effect, EffectKind};
use crate::color::buffer::splice_back;
use crate::color::{Color, channel, clone_spliced, resize_clone};
use crate::error::{Result, StripError};

/// Renders a child into a `size`-wide circular window starting at `offset`
#[derive(Debug)]
pub struct Crop {
    effect: BoxedEffect,
    size: usize,
    offset: i64,
}

impl Crop {
    pub fn new(effect: BoxedEffect, size: usize, offset: i64) -> Result<Self> {
        if size == 0 {
            return Err(StripError::construction("crop size", "must be at least 1"));
        }
        Ok(Self {
            effect,
            size,
            offset,
        })
    }
}

impl Effect for Crop {
    fn kind(&self) -> EffectKind {
        self.effect.kind()
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        let mut window = clone_spliced(pixels, self.size, self.offset);
        self.effect.tick(&mut window, dt);
        splice_back(pixels, &window, self.offset);
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Self {
            effect: self.effect.clone_effect(),
            size: self.size,
            offset: self.offset,
        })
    }
}

/// Renders a child at `size` samples and stretches it over the strip
#[derive(Debug)]
pub struct Resize {
    child: ChildEffect,
    size: usize,
}

impl Resize {
    pub fn new(effect: BoxedEffect, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(StripError::construction("resize size", "must be at least 1"));
        }
        Ok(Self {
            child: ChildEffect::new(effect),
            size,
        })
    }
}

impl Effect for Resize {
    fn kind(&self) -> EffectKind {
        self.child.kind()
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        let n = pixels.len();
        if n == 0 {
            return;
        }
        let virtual_pixels = resize_clone(pixels, self.size);
        let colors = self.child.render(&virtual_pixels, dt);
        let last = self.size - 1;
        for (i, pixel) in pixels.iter_mut().enumerate() {
            let index = if n == 1 {
                0
            } else {
                (i as f64 * last as f64 / (n - 1) as f64) as usize
            };
            *pixel = colors[index.min(last)];
        }
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Self {
            child: self.child.clone_child(),
            size: self.size,
        })
    }
}

/// Replaces a child's alpha, un-premultiplying RGB by the old alpha first
#[derive(Debug)]
pub struct Alpha {
    effect: BoxedEffect,
    alpha: f32,
}

impl Alpha {
    pub fn new(effect: BoxedEffect, alpha: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(StripError::construction(
                "alpha",
                format!("{alpha} is outside [0, 1]"),
            ));
        }
        Ok(Self { effect, alpha })
    }
}

impl Effect for Alpha {
    fn kind(&self) -> EffectKind {
        self.effect.kind()
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        self.effect.tick(pixels, dt);
        for pixel in pixels.iter_mut() {
            if pixel.is_none() || pixel.a <= 0.0 {
                continue;
            }
            let ratio = f64::from(self.alpha) / f64::from(pixel.a);
            *pixel = Color {
                r: channel(f64::from(pixel.r) * ratio),
                g: channel(f64::from(pixel.g) * ratio),
                b: channel(f64::from(pixel.b) * ratio),
                a: self.alpha,
            };
        }
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Self {
            effect: self.effect.clone_effect(),
            alpha: self.alpha,
        })
    }
}
