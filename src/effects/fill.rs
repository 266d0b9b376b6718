//! Static fill from a color selector

use super::{BoxedEffect, Effect, EffectKind};
use crate::color::{Color, ColorSelector};

/// Paints pixel `i` with `selector(i / N)`
#[derive(Debug, Clone)]
pub struct Fill {
    selector: ColorSelector,
}

impl Fill {
    pub fn new(selector: ColorSelector) -> Self {
        Self { selector }
    }

    pub fn solid(color: Color) -> Self {
        Self::new(ColorSelector::Solid(color))
    }

    pub fn rainbow() -> Self {
        Self::new(ColorSelector::Rainbow)
    }
}

impl Effect for Fill {
    fn kind(&self) -> EffectKind {
        EffectKind::Static
    }

    fn tick(&mut self, pixels: &mut [Color], _dt: f64) {
        let n = pixels.len() as f64;
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = self.selector.color_at(i as f64 / n);
        }
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(self.clone())
    }
}
