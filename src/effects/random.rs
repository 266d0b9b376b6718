//! Randomized wrappers
//!
//! Every wrapper rolls its random parameters at construction. `rerolls`
//! controls what clones do: `None` rolls again on every clone, `Some(k)` rolls
//! again for the next `k` generations and then freezes the rolled values.

use super::{BoxedEffect, ChildEffect, Effect, EffectKind};
use crate::color::{Color, fill};
use crate::error::{Result, StripError, finite};
use crate::rng::{Dice, spend_reroll};

fn checked_range(what: &'static str, lower: f64, upper: f64) -> Result<(f64, f64)> {
    let lower = finite(what, lower)?;
    let upper = finite(what, upper)?;
    if lower > upper {
        return Err(StripError::construction(
            what,
            format!("lower bound {lower} exceeds upper bound {upper}"),
        ));
    }
    Ok((lower, upper))
}

/// Plays one effect picked at random from a list
#[derive(Debug)]
pub struct RandChoice {
    effects: Vec<BoxedEffect>,
    chosen: BoxedEffect,
    rerolls: Option<u32>,
    dice: Dice,
}

impl RandChoice {
    pub fn new(effects: Vec<BoxedEffect>, rerolls: Option<u32>) -> Result<Self> {
        Self::with_dice(effects, rerolls, Dice::from_entropy())
    }

    pub fn seeded(effects: Vec<BoxedEffect>, rerolls: Option<u32>, seed: u64) -> Result<Self> {
        Self::with_dice(effects, rerolls, Dice::seeded(seed))
    }

    fn with_dice(effects: Vec<BoxedEffect>, rerolls: Option<u32>, dice: Dice) -> Result<Self> {
        if effects.is_empty() {
            return Err(StripError::construction("random choice", "at least one effect is required"));
        }
        let chosen = effects[dice.index(effects.len())].clone_effect();
        Ok(Self {
            effects,
            chosen,
            rerolls,
            dice,
        })
    }
}

impl Effect for RandChoice {
    fn kind(&self) -> EffectKind {
        self.chosen.kind()
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        self.chosen.tick(pixels, dt);
    }

    fn clone_effect(&self) -> BoxedEffect {
        match spend_reroll(self.rerolls) {
            Some(rerolls) => {
                let effects: Vec<BoxedEffect> =
                    self.effects.iter().map(|e| e.clone_effect()).collect();
                let dice = self.dice.fork();
                let chosen = effects[dice.index(effects.len())].clone_effect();
                Box::new(Self {
                    effects,
                    chosen,
                    rerolls,
                    dice,
                })
            }
            // Out of rerolls: the pick is final
            None => self.chosen.clone_effect(),
        }
    }
}

/// Starts its child at a random point in time
#[derive(Debug)]
pub struct RandTime {
    effect: BoxedEffect,
    lower: f64,
    upper: f64,
    offset: f64,
    first_tick: bool,
    rerolls: Option<u32>,
    dice: Dice,
}

impl RandTime {
    pub fn new(effect: BoxedEffect, lower: f64, upper: f64, rerolls: Option<u32>) -> Result<Self> {
        Self::with_dice(effect, lower, upper, rerolls, Dice::from_entropy())
    }

    pub fn seeded(
        effect: BoxedEffect,
        lower: f64,
        upper: f64,
        rerolls: Option<u32>,
        seed: u64,
    ) -> Result<Self> {
        Self::with_dice(effect, lower, upper, rerolls, Dice::seeded(seed))
    }

    fn with_dice(
        effect: BoxedEffect,
        lower: f64,
        upper: f64,
        rerolls: Option<u32>,
        dice: Dice,
    ) -> Result<Self> {
        let (lower, upper) = checked_range("time offset range", lower, upper)?;
        Ok(Self {
            effect,
            lower,
            upper,
            offset: dice.between(lower, upper),
            first_tick: true,
            rerolls,
            dice,
        })
    }

    fn respawn(&self) -> Self {
        let dice = self.dice.fork();
        let (offset, rerolls) = match spend_reroll(self.rerolls) {
            Some(rerolls) => (dice.between(self.lower, self.upper), rerolls),
            None => (self.offset, Some(0)),
        };
        Self {
            effect: self.effect.clone_effect(),
            lower: self.lower,
            upper: self.upper,
            offset,
            first_tick: true,
            rerolls,
            dice,
        }
    }
}

impl Effect for RandTime {
    fn kind(&self) -> EffectKind {
        self.effect.kind()
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        if self.first_tick {
            self.first_tick = false;
            self.effect.tick(pixels, dt + self.offset);
        } else {
            self.effect.tick(pixels, dt);
        }
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(self.respawn())
    }
}

/// Runs its child's clock at a random rate
#[derive(Debug)]
pub struct RandWarp {
    effect: BoxedEffect,
    lower: f64,
    upper: f64,
    warp: f64,
    rerolls: Option<u32>,
    dice: Dice,
}

impl RandWarp {
    pub fn new(effect: BoxedEffect, lower: f64, upper: f64, rerolls: Option<u32>) -> Result<Self> {
        Self::with_dice(effect, lower, upper, rerolls, Dice::from_entropy())
    }

    pub fn seeded(
        effect: BoxedEffect,
        lower: f64,
        upper: f64,
        rerolls: Option<u32>,
        seed: u64,
    ) -> Result<Self> {
        Self::with_dice(effect, lower, upper, rerolls, Dice::seeded(seed))
    }

    fn with_dice(
        effect: BoxedEffect,
        lower: f64,
        upper: f64,
        rerolls: Option<u32>,
        dice: Dice,
    ) -> Result<Self> {
        let (lower, upper) = checked_range("time warp range", lower, upper)?;
        Ok(Self {
            effect,
            lower,
            upper,
            warp: dice.between(lower, upper),
            rerolls,
            dice,
        })
    }

    fn respawn(&self) -> Self {
        let dice = self.dice.fork();
        let (warp, rerolls) = match spend_reroll(self.rerolls) {
            Some(rerolls) => (dice.between(self.lower, self.upper), rerolls),
            None => (self.warp, Some(0)),
        };
        Self {
            effect: self.effect.clone_effect(),
            lower: self.lower,
            upper: self.upper,
            warp,
            rerolls,
            dice,
        }
    }
}

impl Effect for RandWarp {
    fn kind(&self) -> EffectKind {
        self.effect.kind()
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        self.effect.tick(pixels, dt * self.warp);
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(self.respawn())
    }
}

/// Fills the strip with the child's color at one random position
#[derive(Debug)]
pub struct RandSelect {
    child: ChildEffect,
    index: f64,
    rerolls: Option<u32>,
    dice: Dice,
}

impl RandSelect {
    pub fn new(effect: BoxedEffect, rerolls: Option<u32>) -> Self {
        Self::with_dice(effect, rerolls, Dice::from_entropy())
    }

    pub fn seeded(effect: BoxedEffect, rerolls: Option<u32>, seed: u64) -> Self {
        Self::with_dice(effect, rerolls, Dice::seeded(seed))
    }

    fn with_dice(effect: BoxedEffect, rerolls: Option<u32>, dice: Dice) -> Self {
        Self {
            child: ChildEffect::new(effect),
            index: dice.unit(),
            rerolls,
            dice,
        }
    }

    fn respawn(&self) -> Self {
        let dice = self.dice.fork();
        let (index, rerolls) = match spend_reroll(self.rerolls) {
            Some(rerolls) => (dice.unit(), rerolls),
            None => (self.index, Some(0)),
        };
        Self {
            child: self.child.clone_child(),
            index,
            rerolls,
            dice,
        }
    }
}

impl Effect for RandSelect {
    fn kind(&self) -> EffectKind {
        self.child.kind()
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        let n = pixels.len();
        if n == 0 {
            return;
        }
        let colors = self.child.render(pixels, dt);
        let color = colors[((n as f64 * self.index) as usize).min(n - 1)];
        fill(pixels, color);
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(self.respawn())
    }
}
