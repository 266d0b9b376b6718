//! Time-driven transforms over a child's colors
//!
//! Each transform obtains its base colors from the child (cached while the
//! child is static), advances its own clock by `dt`, then reshapes the base.
//! All of them are dynamic regardless of the child.

use std::f64::consts::{PI, TAU};

use super::{BoxedEffect, ChildEffect, Effect, EffectKind};
use crate::color::buffer::wrap;
use crate::color::{Color, clamp, scale_fill};
use crate::error::{Result, nonzero_finite};

/// Child plus the running clock shared by every timed transform
#[derive(Debug)]
struct Clocked {
    child: ChildEffect,
    period: f64,
    time_sum: f64,
}

impl Clocked {
    fn new(effect: BoxedEffect, period: f64) -> Result<Self> {
        Ok(Self {
            child: ChildEffect::new(effect),
            period: nonzero_finite("period", period)?,
            time_sum: 0.0,
        })
    }

    /// Base colors for this tick; the clock advances afterwards
    fn advance(&mut self, pixels: &[Color], dt: f64) -> Vec<Color> {
        let base = self.child.render(pixels, dt).to_vec();
        self.time_sum += dt;
        base
    }

    /// Elapsed periods
    fn cycles(&self) -> f64 {
        self.time_sum / self.period
    }

    fn fresh(&self) -> Self {
        Self {
            child: self.child.clone_child(),
            period: self.period,
            time_sum: 0.0,
        }
    }
}

/// Index into an `n`-long buffer for a sine value
fn sine_index(sine: f64, n: usize) -> usize {
    let index = ((1.0 + sine) / 2.0 * (n - 1) as f64).round();
    (clamp(index, 0.0, (n - 1) as f64)) as usize
}

/// Whole-buffer circular shift, `sign` = +1 reads ahead, -1 reads behind
fn shifted(base: &[Color], pixels: &mut [Color], offset: i64, sign: i64) {
    let n = base.len();
    for (i, pixel) in pixels.iter_mut().enumerate() {
        *pixel = base[wrap(i as i64 + sign * offset, n)];
    }
}

fn shift_offset(clock: &Clocked, n: usize) -> i64 {
    (clock.cycles() * n as f64).floor() as i64
}

/// Square on/off blink with a half period of `period`
#[derive(Debug)]
pub struct Blink {
    clock: Clocked,
    timer: f64,
}

impl Blink {
    pub fn new(effect: BoxedEffect, period: f64) -> Result<Self> {
        let clock = Clocked::new(effect, period)?;
        let timer = clock.period;
        Ok(Self { clock, timer })
    }
}

impl Effect for Blink {
    fn kind(&self) -> EffectKind {
        EffectKind::Dynamic
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        let base = self.clock.advance(pixels, dt);
        self.timer -= dt;
        if self.timer <= -self.clock.period {
            self.timer = self.clock.period;
        }
        let amplitude = if self.timer > 0.0 { 1.0 } else { 0.0 };
        pixels.copy_from_slice(&base);
        scale_fill(pixels, amplitude);
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Self {
            clock: self.clock.fresh(),
            timer: self.clock.period,
        })
    }
}

macro_rules! amplitude_effect {
    ($(#[$doc:meta])* $name:ident, |$t:ident| $amplitude:expr) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name {
            clock: Clocked,
        }

        impl $name {
            pub fn new(effect: BoxedEffect, period: f64) -> Result<Self> {
                Ok(Self {
                    clock: Clocked::new(effect, period)?,
                })
            }
        }

        impl Effect for $name {
            fn kind(&self) -> EffectKind {
                EffectKind::Dynamic
            }

            fn tick(&mut self, pixels: &mut [Color], dt: f64) {
                let base = self.clock.advance(pixels, dt);
                let $t = self.clock.cycles();
                pixels.copy_from_slice(&base);
                scale_fill(pixels, $amplitude);
            }

            fn clone_effect(&self) -> BoxedEffect {
                Box::new(Self {
                    clock: self.clock.fresh(),
                })
            }
        }
    };
}

amplitude_effect!(
    /// Ramps brightness from 0 to 1 over `period`
    FadeIn,
    |t| clamp(t, 0.0, 1.0)
);
amplitude_effect!(
    /// Ramps brightness from 1 to 0 over `period`
    FadeOut,
    |t| clamp(1.0 - t, 0.0, 1.0)
);
amplitude_effect!(
    /// Sinusoidal breathing, one full swing every two periods
    BlinkFade,
    |t| ((t * PI).sin() + 1.0) / 2.0
);

/// Travelling sine wave that samples the child's colors along the strip
#[derive(Debug)]
pub struct Wave {
    clock: Clocked,
    wavelength: f64,
}

impl Wave {
    pub fn new(effect: BoxedEffect, period: f64, wavelength: f64) -> Result<Self> {
        Ok(Self {
            clock: Clocked::new(effect, period)?,
            wavelength: nonzero_finite("wavelength", wavelength)?,
        })
    }
}

impl Effect for Wave {
    fn kind(&self) -> EffectKind {
        EffectKind::Dynamic
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        let base = self.clock.advance(pixels, dt);
        let n = base.len();
        if n == 0 {
            return;
        }
        let t = self.clock.cycles();
        for (i, pixel) in pixels.iter_mut().enumerate() {
            let phase = (i as f64 / self.wavelength - t) * TAU;
            *pixel = base[sine_index(phase.sin(), n)];
        }
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Self {
            clock: self.clock.fresh(),
            wavelength: self.wavelength,
        })
    }
}

/// Whole strip cycles through the child's colors in one sinusoidal sweep
#[derive(Debug)]
pub struct Wheel {
    clock: Clocked,
}

impl Wheel {
    pub fn new(effect: BoxedEffect, period: f64) -> Result<Self> {
        Ok(Self {
            clock: Clocked::new(effect, period)?,
        })
    }
}

impl Effect for Wheel {
    fn kind(&self) -> EffectKind {
        EffectKind::Dynamic
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        let base = self.clock.advance(pixels, dt);
        let n = base.len();
        if n == 0 {
            return;
        }
        let phase = -self.clock.cycles() * TAU;
        crate::color::fill(pixels, base[sine_index(phase.sin(), n)]);
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Self {
            clock: self.clock.fresh(),
        })
    }
}

/// Rotates the child's colors toward the start of the strip, one lap per period
#[derive(Debug)]
pub struct Wipe {
    clock: Clocked,
}

impl Wipe {
    pub fn new(effect: BoxedEffect, period: f64) -> Result<Self> {
        Ok(Self {
            clock: Clocked::new(effect, period)?,
        })
    }
}

impl Effect for Wipe {
    fn kind(&self) -> EffectKind {
        EffectKind::Dynamic
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        let base = self.clock.advance(pixels, dt);
        if base.is_empty() {
            return;
        }
        let offset = shift_offset(&self.clock, base.len());
        shifted(&base, pixels, offset, 1);
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Self {
            clock: self.clock.fresh(),
        })
    }
}

/// Rotates the child's colors toward the end of the strip, one lap per period
#[derive(Debug)]
pub struct Slide {
    clock: Clocked,
}

impl Slide {
    pub fn new(effect: BoxedEffect, period: f64) -> Result<Self> {
        Ok(Self {
            clock: Clocked::new(effect, period)?,
        })
    }
}

impl Effect for Slide {
    fn kind(&self) -> EffectKind {
        EffectKind::Dynamic
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        let base = self.clock.advance(pixels, dt);
        if base.is_empty() {
            return;
        }
        let offset = shift_offset(&self.clock, base.len());
        shifted(&base, pixels, offset, -1);
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Self {
            clock: self.clock.fresh(),
        })
    }
}

/// Paints the child's colors over the strip's first-seen contents, sweeping
/// from the start (positive period) or the end (negative period)
#[derive(Debug)]
pub struct ColorWipe {
    clock: Clocked,
    original: Option<Vec<Color>>,
}

impl ColorWipe {
    pub fn new(effect: BoxedEffect, period: f64) -> Result<Self> {
        Ok(Self {
            clock: Clocked::new(effect, period)?,
            original: None,
        })
    }
}

impl Effect for ColorWipe {
    fn kind(&self) -> EffectKind {
        EffectKind::Dynamic
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        let original = match &self.original {
            Some(original) if original.len() == pixels.len() => original.clone(),
            _ => {
                let original = pixels.to_vec();
                self.original = Some(original.clone());
                original
            }
        };
        let colors = self.clock.advance(pixels, dt);
        let n = pixels.len();
        let cutoff = self.clock.cycles() * n as f64;
        for (i, pixel) in pixels.iter_mut().enumerate() {
            let from_start = if cutoff >= 0.0 { i } else { n - 1 - i };
            *pixel = if from_start as f64 <= cutoff.abs() {
                colors[i]
            } else {
                original[i]
            };
        }
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Self {
            clock: self.clock.fresh(),
            original: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::*;

    #[test]
    fn test_blink_cycle() {
        let mut blink = Blink::new(solid(Color::RED), 1.0).unwrap();
        let mut pixels = vec![Color::NONE; 2];
        blink.tick(&mut pixels, 0.5);
        assert_eq!(pixels[0], Color::RED);
        blink.tick(&mut pixels, 0.6);
        assert_eq!(pixels[0], Color::TRANSPARENT);
        blink.tick(&mut pixels, 1.0);
        assert_eq!(pixels[0], Color::RED);
    }

    #[test]
    fn test_fades() {
        let mut fade_in = FadeIn::new(solid(Color::RED), 2.0).unwrap();
        let mut fade_out = FadeOut::new(solid(Color::RED), 2.0).unwrap();
        let mut pixels = vec![Color::NONE; 1];
        fade_in.tick(&mut pixels, 1.0);
        assert_eq!(pixels[0].r, 127);
        fade_in.tick(&mut pixels, 5.0);
        assert_eq!(pixels[0], Color::RED);
        fade_out.tick(&mut pixels, 3.0);
        assert_eq!(pixels[0], Color::TRANSPARENT);
    }

    #[test]
    fn test_blink_fade_midpoint() {
        let mut fade = BlinkFade::new(solid(Color::WHITE), 1.0).unwrap();
        let mut pixels = vec![Color::NONE; 1];
        fade.tick(&mut pixels, 0.5);
        assert_eq!(pixels[0], Color::WHITE);
        fade.tick(&mut pixels, 1.0);
        assert_eq!(pixels[0].r, 0);
    }

    #[test]
    fn test_wave_phase() {
        let mut wave = Wave::new(Box::new(Ramp), 1.0, 1000.0).unwrap();
        let mut pixels = vec![Color::NONE; 5];
        wave.tick(&mut pixels, 0.0);
        assert_eq!(pixels[0].r, 2);
        wave.tick(&mut pixels, 0.25);
        assert_eq!(pixels[0].r, 0);
    }

    #[test]
    fn test_wheel_uses_one_color() {
        let mut wheel = Wheel::new(Box::new(Ramp), 1.0).unwrap();
        let mut pixels = vec![Color::NONE; 5];
        wheel.tick(&mut pixels, 0.75);
        assert_eq!(reds(&pixels), vec![4; 5]);
    }

    #[test]
    fn test_wipe_and_slide_are_mirrored() {
        let mut wipe = Wipe::new(Box::new(Ramp), 1.0).unwrap();
        let mut slide = Slide::new(Box::new(Ramp), 1.0).unwrap();
        let mut pixels = vec![Color::NONE; 4];
        wipe.tick(&mut pixels, 0.25);
        assert_eq!(reds(&pixels), vec![1, 2, 3, 0]);
        slide.tick(&mut pixels, 0.25);
        assert_eq!(reds(&pixels), vec![3, 0, 1, 2]);
    }

    #[test]
    fn test_color_wipe_progress() {
        let mut wipe = ColorWipe::new(solid(Color::RED), 1.0).unwrap();
        let mut pixels = vec![Color::BLACK; 10];
        wipe.tick(&mut pixels, 0.35);
        assert_eq!(reds(&pixels), vec![255, 255, 255, 255, 0, 0, 0, 0, 0, 0]);
        wipe.tick(&mut pixels, 1.0);
        assert!(pixels.iter().all(|p| *p == Color::RED));
    }

    #[test]
    fn test_color_wipe_negative_period() {
        let mut wipe = ColorWipe::new(solid(Color::RED), -1.0).unwrap();
        let mut pixels = vec![Color::BLACK; 10];
        wipe.tick(&mut pixels, 0.2);
        assert_eq!(reds(&pixels), vec![0, 0, 0, 0, 0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_clones_keep_independent_clocks() {
        let original = FadeIn::new(solid(Color::RED), 4.0).unwrap();
        let mut a = original.clone_effect();
        let mut b = original.clone_effect();
        let mut pa = vec![Color::NONE; 1];
        let mut pb = vec![Color::NONE; 1];
        a.tick(&mut pa, 2.0);
        b.tick(&mut pb, 1.0);
        a.tick(&mut pa, 2.0);
        assert_eq!(pa[0], Color::RED);
        assert_eq!(pb[0].r, 63);
    }

    #[test]
    fn test_rejects_bad_periods() {
        assert!(Blink::new(solid(Color::RED), 0.0).is_err());
        assert!(Wave::new(solid(Color::RED), 1.0, f64::NAN).is_err());
        assert!(Slide::new(solid(Color::RED), f64::INFINITY).is_err());
    }
}
