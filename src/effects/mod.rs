//! Effect contract and the composable effect library
//!
//! Every effect is a boxed [`Effect`] trait object. An effect is either
//! `Static` (rendered once, then retired by the controller) or `Dynamic`
//! (re-rendered every tick with the elapsed time). Composites are dynamic iff
//! any child is dynamic, and cache the output of static children.

pub mod composite;
pub mod control;
pub mod fill;
pub mod positional;
pub mod random;
pub mod spectrum;
pub mod timed;

pub use composite::{Gradient, Split};
pub use control::{Child, DebugClone, Parent, Share};
pub use fill::Fill;
pub use positional::{Alpha, Crop, Resize};
pub use random::{RandChoice, RandSelect, RandTime, RandWarp};
pub use spectrum::{ChannelFeed, Spectrum, SpectrumFeed};
pub use timed::{Blink, BlinkFade, ColorWipe, FadeIn, FadeOut, Slide, Wave, Wheel, Wipe};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Lifecycle class of an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Evaluated once, then retired
    Static,
    /// Evaluated every tick with the elapsed time
    Dynamic,
}

impl EffectKind {
    /// Dynamic iff any of the given kinds is dynamic
    pub fn combine(kinds: impl IntoIterator<Item = EffectKind>) -> EffectKind {
        if kinds.into_iter().any(|k| k == EffectKind::Dynamic) {
            EffectKind::Dynamic
        } else {
            EffectKind::Static
        }
    }
}

/// A time-varying producer of pixel colors
pub trait Effect: Send + fmt::Debug {
    /// Current lifecycle class
    fn kind(&self) -> EffectKind;

    /// Render into `pixels` in place, `dt` seconds after the previous tick
    fn tick(&mut self, pixels: &mut [Color], dt: f64);

    /// Independent copy with the same parameters and fresh runtime state
    fn clone_effect(&self) -> Box<dyn Effect>;
}

/// Boxed effect, the unit everything composes with
pub type BoxedEffect = Box<dyn Effect>;

/// A child effect plus the cached output of its last static render
#[derive(Debug)]
pub(crate) struct ChildEffect {
    pub effect: BoxedEffect,
    cache: Option<Vec<Color>>,
}

impl ChildEffect {
    pub fn new(effect: BoxedEffect) -> Self {
        Self {
            effect,
            cache: None,
        }
    }

    pub fn kind(&self) -> EffectKind {
        self.effect.kind()
    }

    /// Render the child on a copy of `input`, reusing the cached result while
    /// the child is static and the cached length still matches
    pub fn render(&mut self, input: &[Color], dt: f64) -> &[Color] {
        let stale = match &self.cache {
            None => true,
            Some(cached) => cached.len() != input.len() || self.kind() == EffectKind::Dynamic,
        };
        if stale {
            let mut colors = input.to_vec();
            self.effect.tick(&mut colors, dt);
            self.cache = Some(colors);
        }
        self.cache.as_deref().unwrap_or(&[])
    }

    /// Fresh copy of the child without its cache
    pub fn clone_child(&self) -> Self {
        Self::new(self.effect.clone_effect())
    }
}
