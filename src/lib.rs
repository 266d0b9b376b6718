//! strip-fx - Composable effects for addressable LED strips
//!
//! Core modules:
//! - `color`: RGBA pixels, blend arithmetic and buffer utilities
//! - `effects`: The effect contract and the effect library built on it
//! - `physics`: 1-D particle engine with collisions and behaviors
//! - `controller`: Layered compositor, render loop and pixel sinks
//! - `settings`: JSON strip settings

pub mod color;
pub mod controller;
pub mod effects;
pub mod error;
pub mod physics;
pub mod rng;
pub mod settings;

pub use color::Color;
pub use controller::{Controller, ControllerHandle, MergeMode, PixelSink};
pub use effects::{BoxedEffect, Effect, EffectKind};
pub use error::{Result, StripError};
pub use settings::StripSettings;

/// Engine configuration constants
pub mod consts {
    /// Default strip length
    pub const DEFAULT_PIXEL_COUNT: usize = 150;
    /// Default render cadence
    pub const DEFAULT_TICKS_PER_SECOND: f64 = 60.0;

    /// Particle sprite resolution: samples per unit of radius, plus a floor
    pub const SPRITE_SAMPLES_PER_RADIUS: f64 = 10.0;
    pub const SPRITE_EXTRA_SAMPLES: f64 = 5.0;
    /// Splats are cut off at this many radii from the center
    pub const GAUSSIAN_CUTOFF: f64 = 3.0;
}
