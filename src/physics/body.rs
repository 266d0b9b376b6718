//! One-dimensional rigid bodies with constant-acceleration integration

use crate::error::{Result, StripError, finite};
use crate::rng::{Dice, spend_reroll};

/// Snapshot of a body's kinematic state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
    pub mass: f64,
}

impl BodyState {
    /// State after `dt` seconds of constant acceleration
    pub fn advanced(&self, dt: f64) -> BodyState {
        BodyState {
            position: self.position + (self.velocity + self.acceleration * dt / 2.0) * dt,
            velocity: self.velocity + self.acceleration * dt,
            ..*self
        }
    }
}

/// Uniform spawn ranges for a randomized body, each `(lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRanges {
    pub position: (f64, f64),
    pub velocity: (f64, f64),
    pub acceleration: (f64, f64),
    pub mass: (f64, f64),
}

impl SpawnRanges {
    /// Position range only; at rest with unit mass
    pub fn at(lower: f64, upper: f64) -> Self {
        Self {
            position: (lower, upper),
            velocity: (0.0, 0.0),
            acceleration: (0.0, 0.0),
            mass: (1.0, 1.0),
        }
    }

    pub fn velocity(mut self, lower: f64, upper: f64) -> Self {
        self.velocity = (lower, upper);
        self
    }

    pub fn acceleration(mut self, lower: f64, upper: f64) -> Self {
        self.acceleration = (lower, upper);
        self
    }

    pub fn mass(mut self, lower: f64, upper: f64) -> Self {
        self.mass = (lower, upper);
        self
    }

    fn validate(&self) -> Result<()> {
        for (what, (lower, upper)) in [
            ("position range", self.position),
            ("velocity range", self.velocity),
            ("acceleration range", self.acceleration),
            ("mass range", self.mass),
        ] {
            finite(what, lower)?;
            finite(what, upper)?;
            if lower > upper {
                return Err(StripError::construction(
                    what,
                    format!("lower bound {lower} exceeds upper bound {upper}"),
                ));
            }
        }
        if self.mass.0 <= 0.0 {
            return Err(StripError::construction("mass range", "masses must be positive"));
        }
        Ok(())
    }

    fn roll(&self, dice: &Dice) -> BodyState {
        BodyState {
            position: dice.between(self.position.0, self.position.1),
            velocity: dice.between(self.velocity.0, self.velocity.1),
            acceleration: dice.between(self.acceleration.0, self.acceleration.1),
            mass: dice.between(self.mass.0, self.mass.1),
        }
    }
}

#[derive(Debug)]
struct RandomSpawn {
    ranges: SpawnRanges,
    rerolls: Option<u32>,
    dice: Dice,
}

/// A point mass moving along the strip
#[derive(Debug)]
pub struct PhysicsBody {
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
    pub mass: f64,
    prev_position: f64,
    prev_velocity: f64,
    spawn: Option<RandomSpawn>,
}

impl PhysicsBody {
    pub fn new(position: f64, velocity: f64, acceleration: f64, mass: f64) -> Result<Self> {
        let state = BodyState {
            position: finite("position", position)?,
            velocity: finite("velocity", velocity)?,
            acceleration: finite("acceleration", acceleration)?,
            mass: finite("mass", mass)?,
        };
        if mass <= 0.0 {
            return Err(StripError::construction("mass", format!("{mass} must be positive")));
        }
        Ok(Self::from_state(state))
    }

    /// Body drawn from `ranges`, rerolled on clone under the `rerolls` budget
    pub fn random(ranges: SpawnRanges, rerolls: Option<u32>) -> Result<Self> {
        Self::random_with(ranges, rerolls, Dice::from_entropy())
    }

    pub fn random_seeded(ranges: SpawnRanges, rerolls: Option<u32>, seed: u64) -> Result<Self> {
        Self::random_with(ranges, rerolls, Dice::seeded(seed))
    }

    fn random_with(ranges: SpawnRanges, rerolls: Option<u32>, dice: Dice) -> Result<Self> {
        ranges.validate()?;
        let mut body = Self::from_state(ranges.roll(&dice));
        body.spawn = Some(RandomSpawn {
            ranges,
            rerolls,
            dice,
        });
        Ok(body)
    }

    fn from_state(state: BodyState) -> Self {
        Self {
            position: state.position,
            velocity: state.velocity,
            acceleration: state.acceleration,
            mass: state.mass,
            prev_position: state.position,
            prev_velocity: state.velocity,
            spawn: None,
        }
    }

    pub fn state(&self) -> BodyState {
        BodyState {
            position: self.position,
            velocity: self.velocity,
            acceleration: self.acceleration,
            mass: self.mass,
        }
    }

    /// State at the start of the last integrated step
    pub fn previous(&self) -> BodyState {
        BodyState {
            position: self.prev_position,
            velocity: self.prev_velocity,
            ..self.state()
        }
    }

    /// State `t` seconds into the last integrated step
    pub fn state_at(&self, t: f64) -> BodyState {
        self.previous().advanced(t)
    }

    pub fn tick(&mut self, dt: f64) {
        self.prev_position = self.position;
        self.prev_velocity = self.velocity;
        let next = self.state().advanced(dt);
        self.position = next.position;
        self.velocity = next.velocity;
    }

    /// Replace position and velocity without touching the step history
    pub fn set_motion(&mut self, position: f64, velocity: f64) {
        self.position = position;
        self.velocity = velocity;
    }

    /// Shift the body, and its step history, into another frame of reference
    pub fn translate(&mut self, position: f64, velocity: f64) {
        self.position += position;
        self.velocity += velocity;
        self.prev_position += position;
        self.prev_velocity += velocity;
    }

    /// Copy for a new particle; randomized bodies reroll while they have budget
    pub fn respawn(&self) -> PhysicsBody {
        let Some(spawn) = &self.spawn else {
            return Self::from_state(self.state());
        };
        match spend_reroll(spawn.rerolls) {
            Some(rerolls) => {
                let dice = spawn.dice.fork();
                let mut body = Self::from_state(spawn.ranges.roll(&dice));
                body.spawn = Some(RandomSpawn {
                    ranges: spawn.ranges,
                    rerolls,
                    dice,
                });
                body
            }
            None => Self::from_state(self.state()),
        }
    }
}
