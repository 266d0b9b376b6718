//! Particle behaviors
//!
//! Behaviors run once per particle per tick, after collision detection. They
//! can move, fade or kill their particle, spawn new particles through the
//! [`Spawner`], and attach further behaviors. A behavior that reports itself
//! dead is dropped at the end of the tick.

use std::fmt;

use super::body::BodyState;
use super::particle::Particle;
use super::tag::{Tag, TagSet, fork_all};
use crate::error::{Result, StripError, finite, non_negative, nonzero_finite};

/// Deferred particle insertions, applied by the engine at the tick boundary
#[derive(Debug, Default)]
pub struct Spawner {
    spawned: Vec<Particle>,
}

impl Spawner {
    pub fn spawn(&mut self, particle: Particle) {
        self.spawned.push(particle);
    }

    pub fn len(&self) -> usize {
        self.spawned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty()
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, Particle> {
        self.spawned.drain(..)
    }
}

/// Per-particle rule ticked by the physics engine
pub trait Behavior: Send + fmt::Debug {
    fn tick(&mut self, spawner: &mut Spawner, particle: &mut Particle, dt: f64);

    /// Same parameters, fresh state
    fn clone_behavior(&self) -> BoxedBehavior;

    fn is_alive(&self) -> bool {
        true
    }
}

pub type BoxedBehavior = Box<dyn Behavior>;

/// Copy of `emission` placed in the carrier's frame of reference
fn launch(emission: &Particle, carrier: &Particle) -> Particle {
    let mut particle = emission.clone_particle();
    let carrier = &carrier.entity.body;
    particle
        .entity
        .body
        .translate(carrier.position, carrier.velocity);
    particle
}

/// Emits `density` particles per second
#[derive(Debug)]
pub struct Emitter {
    emission: Particle,
    density: f64,
    time_sum: f64,
    emitted: u64,
}

impl Emitter {
    pub fn new(emission: Particle, density: f64) -> Result<Self> {
        Ok(Self {
            emission,
            density: non_negative("emission density", density)?,
            time_sum: 0.0,
            emitted: 0,
        })
    }
}

impl Behavior for Emitter {
    fn tick(&mut self, spawner: &mut Spawner, particle: &mut Particle, dt: f64) {
        self.time_sum += dt;
        while self.time_sum * self.density > self.emitted as f64 {
            spawner.spawn(launch(&self.emission, particle));
            self.emitted += 1;
        }
    }

    fn clone_behavior(&self) -> BoxedBehavior {
        Box::new(Self {
            emission: self.emission.clone_particle(),
            density: self.density,
            time_sum: 0.0,
            emitted: 0,
        })
    }
}

/// Bursts of `count` particles, once per `fuse` seconds; a zero fuse bursts
/// once immediately
#[derive(Debug)]
pub struct Explosion {
    emission: Particle,
    count: usize,
    fuse: f64,
    time_sum: f64,
    bursts: u64,
}

impl Explosion {
    pub fn new(emission: Particle, count: usize, fuse: f64) -> Result<Self> {
        Ok(Self {
            emission,
            count,
            fuse: non_negative("fuse", fuse)?,
            time_sum: 0.0,
            bursts: 0,
        })
    }

    fn burst(&mut self, spawner: &mut Spawner, particle: &Particle) {
        for _ in 0..self.count {
            spawner.spawn(launch(&self.emission, particle));
        }
        self.bursts += 1;
        log::debug!("Explosion burst {} at {:.2}", self.bursts, particle.position());
    }
}

impl Behavior for Explosion {
    fn tick(&mut self, spawner: &mut Spawner, particle: &mut Particle, dt: f64) {
        self.time_sum += dt;
        if self.fuse == 0.0 {
            if self.bursts == 0 {
                self.burst(spawner, particle);
            }
            return;
        }
        while self.time_sum >= (self.bursts + 1) as f64 * self.fuse {
            self.burst(spawner, particle);
        }
    }

    fn clone_behavior(&self) -> BoxedBehavior {
        Box::new(Self {
            emission: self.emission.clone_particle(),
            count: self.count,
            fuse: self.fuse,
            time_sum: 0.0,
            bursts: 0,
        })
    }

    fn is_alive(&self) -> bool {
        !(self.fuse == 0.0 && self.bursts > 0)
    }
}

/// Attaches copies of `behaviors` when the particle hits an entity carrying
/// every tag in `tags`
#[derive(Debug)]
pub struct Collision {
    behaviors: Vec<BoxedBehavior>,
    once: bool,
    tags: TagSet,
    fired: bool,
}

impl Collision {
    pub fn new(
        behaviors: Vec<BoxedBehavior>,
        once: bool,
        tags: impl IntoIterator<Item = Tag>,
    ) -> Self {
        Self {
            behaviors,
            once,
            tags: tags.into_iter().collect(),
            fired: false,
        }
    }
}

impl Behavior for Collision {
    fn tick(&mut self, spawner: &mut Spawner, particle: &mut Particle, _dt: f64) {
        let hits = particle
            .entity
            .collisions
            .values()
            .filter(|event| self.tags.is_subset(&event.other_tags))
            .count();
        for _ in 0..hits {
            if !particle.entity.alive || (self.once && self.fired) {
                break;
            }
            for template in &self.behaviors {
                let mut behavior = template.clone_behavior();
                behavior.tick(spawner, particle, 0.0);
                particle.add_behavior(behavior);
            }
            self.fired = true;
        }
    }

    fn clone_behavior(&self) -> BoxedBehavior {
        Box::new(Self {
            behaviors: self.behaviors.iter().map(|b| b.clone_behavior()).collect(),
            once: self.once,
            tags: fork_all(&self.tags),
            fired: false,
        })
    }

    fn is_alive(&self) -> bool {
        !(self.once && self.fired)
    }
}

/// Elastic-to-inelastic bounce off entities carrying every tag in `tags`
#[derive(Debug)]
pub struct RigidCollider {
    restitution: f64,
    tags: TagSet,
}

impl RigidCollider {
    pub fn new(restitution: f64, tags: impl IntoIterator<Item = Tag>) -> Result<Self> {
        Ok(Self {
            restitution: non_negative("restitution", restitution)?,
            tags: tags.into_iter().collect(),
        })
    }

    /// Post-impact velocity of `own` after hitting `other`
    pub fn bounce(restitution: f64, own: &BodyState, other: &BodyState) -> f64 {
        let (m1, u1) = (own.mass, own.velocity);
        let (m2, u2) = (other.mass, other.velocity);
        (restitution * m2 * (u2 - u1) + m1 * u1 + m2 * u2) / (m1 + m2)
    }
}

impl Behavior for RigidCollider {
    fn tick(&mut self, _spawner: &mut Spawner, particle: &mut Particle, _dt: f64) {
        let earliest = particle
            .entity
            .collisions
            .values()
            .filter(|event| self.tags.is_subset(&event.other_tags))
            .min_by(|a, b| a.time.total_cmp(&b.time));
        let Some(event) = earliest else {
            return;
        };
        let own = event.own_at_impact;
        let rebound = BodyState {
            velocity: Self::bounce(self.restitution, &own, &event.other_at_impact),
            ..own
        }
        .advanced(event.step - event.time);
        particle
            .entity
            .body
            .set_motion(rebound.position, rebound.velocity);
    }

    fn clone_behavior(&self) -> BoxedBehavior {
        Box::new(Self {
            restitution: self.restitution,
            tags: fork_all(&self.tags),
        })
    }
}

/// Kills the particle after `duration` seconds
#[derive(Debug)]
pub struct Lifetime {
    duration: f64,
    time_sum: f64,
}

impl Lifetime {
    pub fn new(duration: f64) -> Result<Self> {
        Ok(Self {
            duration: non_negative("lifetime", duration)?,
            time_sum: 0.0,
        })
    }
}

impl Behavior for Lifetime {
    fn tick(&mut self, _spawner: &mut Spawner, particle: &mut Particle, dt: f64) {
        self.time_sum += dt;
        if self.time_sum >= self.duration {
            particle.entity.alive = false;
        }
    }

    fn clone_behavior(&self) -> BoxedBehavior {
        Box::new(Self {
            duration: self.duration,
            time_sum: 0.0,
        })
    }
}

/// Halves brightness every `half_life` seconds
#[derive(Debug)]
pub struct Decay {
    half_life: f64,
    time_sum: f64,
}

impl Decay {
    pub fn new(half_life: f64) -> Result<Self> {
        let half_life = nonzero_finite("half life", half_life)?;
        if half_life < 0.0 {
            return Err(StripError::construction("half life", "must be positive"));
        }
        Ok(Self {
            half_life,
            time_sum: 0.0,
        })
    }
}

impl Behavior for Decay {
    fn tick(&mut self, _spawner: &mut Spawner, particle: &mut Particle, dt: f64) {
        self.time_sum += dt;
        particle.brightness = 0.5f64.powf(self.time_sum / self.half_life);
    }

    fn clone_behavior(&self) -> BoxedBehavior {
        Box::new(Self {
            half_life: self.half_life,
            time_sum: 0.0,
        })
    }
}

/// One-shot velocity change `constant + coefficient * velocity`
#[derive(Debug)]
pub struct Impulse {
    constant: f64,
    coefficient: f64,
    applied: bool,
}

impl Impulse {
    pub fn new(constant: f64, coefficient: f64) -> Result<Self> {
        Ok(Self {
            constant: finite("impulse", constant)?,
            coefficient: finite("impulse coefficient", coefficient)?,
            applied: false,
        })
    }
}

impl Behavior for Impulse {
    fn tick(&mut self, _spawner: &mut Spawner, particle: &mut Particle, _dt: f64) {
        if self.applied {
            return;
        }
        let body = &mut particle.entity.body;
        body.velocity += self.constant + self.coefficient * body.velocity;
        self.applied = true;
    }

    fn clone_behavior(&self) -> BoxedBehavior {
        Box::new(Self {
            constant: self.constant,
            coefficient: self.coefficient,
            applied: false,
        })
    }

    fn is_alive(&self) -> bool {
        !self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::effects::testing::solid;
    use crate::physics::PhysicsBody;
    use crate::physics::collision::CollisionEvent;

    fn particle_at(position: f64, velocity: f64) -> Particle {
        let body = PhysicsBody::new(position, velocity, 0.0, 1.0).unwrap();
        Particle::new(solid(Color::RED), body, 1.0).unwrap()
    }

    fn hit(particle: &mut Particle, other: u64, tags: &[&str], time: f64, other_velocity: f64) {
        let own = particle.entity.body.state();
        particle.entity.collisions.insert(
            other,
            CollisionEvent {
                other,
                other_tags: tags.iter().map(|t| Tag::new(*t)).collect(),
                time,
                step: 1.0,
                own_at_impact: own,
                other_at_impact: BodyState {
                    velocity: other_velocity,
                    ..own
                },
            },
        );
    }

    #[test]
    fn test_emitter_rate() {
        let mut emitter = Emitter::new(particle_at(1.0, 2.0), 4.0).unwrap();
        let mut carrier = particle_at(10.0, -1.0);
        let mut spawner = Spawner::default();
        emitter.tick(&mut spawner, &mut carrier, 0.5);
        assert_eq!(spawner.len(), 2);
        emitter.tick(&mut spawner, &mut carrier, 0.2);
        assert_eq!(spawner.len(), 3);
        let first = spawner.drain().next().unwrap();
        assert_eq!(first.position(), 11.0);
        assert_eq!(first.entity.body.velocity, 1.0);
    }

    #[test]
    fn test_explosion_zero_fuse_bursts_once() {
        let mut explosion = Explosion::new(particle_at(0.0, 0.0), 5, 0.0).unwrap();
        let mut carrier = particle_at(0.0, 0.0);
        let mut spawner = Spawner::default();
        explosion.tick(&mut spawner, &mut carrier, 0.1);
        assert_eq!(spawner.len(), 5);
        assert!(!explosion.is_alive());
        explosion.tick(&mut spawner, &mut carrier, 0.1);
        assert_eq!(spawner.len(), 5);
    }

    #[test]
    fn test_explosion_fuse_repeats() {
        let mut explosion = Explosion::new(particle_at(0.0, 0.0), 2, 1.0).unwrap();
        let mut carrier = particle_at(0.0, 0.0);
        let mut spawner = Spawner::default();
        explosion.tick(&mut spawner, &mut carrier, 0.5);
        assert!(spawner.is_empty());
        explosion.tick(&mut spawner, &mut carrier, 0.5);
        assert_eq!(spawner.len(), 2);
        explosion.tick(&mut spawner, &mut carrier, 1.0);
        assert_eq!(spawner.len(), 4);
        assert!(explosion.is_alive());
    }

    #[test]
    fn test_lifetime_kills() {
        let mut lifetime = Lifetime::new(1.0).unwrap();
        let mut particle = particle_at(0.0, 0.0);
        let mut spawner = Spawner::default();
        lifetime.tick(&mut spawner, &mut particle, 0.6);
        assert!(particle.entity.alive);
        lifetime.tick(&mut spawner, &mut particle, 0.6);
        assert!(!particle.entity.alive);
    }

    #[test]
    fn test_decay_half_life() {
        let mut decay = Decay::new(2.0).unwrap();
        let mut particle = particle_at(0.0, 0.0);
        let mut spawner = Spawner::default();
        decay.tick(&mut spawner, &mut particle, 2.0);
        assert!((particle.brightness - 0.5).abs() < 1e-12);
        decay.tick(&mut spawner, &mut particle, 1000.0);
        assert!(particle.brightness < 1e-12);
        assert!(Decay::new(0.0).is_err());
        assert!(Decay::new(-1.0).is_err());
    }

    #[test]
    fn test_impulse_once() {
        let mut impulse = Impulse::new(1.0, -2.0).unwrap();
        let mut particle = particle_at(0.0, 3.0);
        let mut spawner = Spawner::default();
        impulse.tick(&mut spawner, &mut particle, 0.1);
        assert_eq!(particle.entity.body.velocity, -2.0);
        assert!(!impulse.is_alive());
        impulse.tick(&mut spawner, &mut particle, 0.1);
        assert_eq!(particle.entity.body.velocity, -2.0);
    }

    #[test]
    fn test_rigid_collider_swaps_equal_masses() {
        let own = BodyState {
            position: 0.0,
            velocity: 5.0,
            acceleration: 0.0,
            mass: 2.0,
        };
        let other = BodyState {
            velocity: -3.0,
            ..own
        };
        assert_eq!(RigidCollider::bounce(1.0, &own, &other), -3.0);
        assert_eq!(RigidCollider::bounce(1.0, &other, &own), 5.0);
        // Perfectly inelastic: common velocity
        assert_eq!(RigidCollider::bounce(0.0, &own, &other), 1.0);
    }

    #[test]
    fn test_rigid_collider_reintegrates_rest_of_step() {
        let mut collider = RigidCollider::new(1.0, [Tag::new("wall")]).unwrap();
        let mut particle = particle_at(0.0, 2.0);
        hit(&mut particle, 7, &["wall"], 0.25, -2.0);
        let mut spawner = Spawner::default();
        collider.tick(&mut spawner, &mut particle, 1.0);
        assert_eq!(particle.entity.body.velocity, -2.0);
        assert_eq!(particle.position(), -1.5);
    }

    #[test]
    fn test_rigid_collider_ignores_other_tags() {
        let mut collider = RigidCollider::new(1.0, [Tag::new("wall")]).unwrap();
        let mut particle = particle_at(0.0, 2.0);
        hit(&mut particle, 7, &["ghost"], 0.25, -2.0);
        collider.tick(&mut Spawner::default(), &mut particle, 1.0);
        assert_eq!(particle.entity.body.velocity, 2.0);
    }

    #[test]
    fn test_collision_trigger_attaches_behaviors() {
        let lifetime: BoxedBehavior = Box::new(Lifetime::new(0.0).unwrap());
        let mut trigger = Collision::new(vec![lifetime], true, [Tag::new("wall")]);
        let mut particle = particle_at(0.0, 0.0);
        let mut spawner = Spawner::default();

        trigger.tick(&mut spawner, &mut particle, 0.1);
        assert!(trigger.is_alive());

        hit(&mut particle, 1, &["wall", "left"], 0.5, 0.0);
        trigger.tick(&mut spawner, &mut particle, 0.1);
        // The attached lifetime ran once with dt = 0 and expired the particle
        assert!(!particle.entity.alive);
        assert!(!trigger.is_alive());
    }
}
