//! The particle engine effect
//!
//! Tick order:
//! 1. integrate every body
//! 2. detect collisions between collidable pairs
//! 3. per particle: refresh the sprite, run behaviors
//! 4. drop dead particles, admit spawns
//! 5. render Gaussian splats

use super::behavior::Spawner;
use super::collision::{CollisionEvent, EntityId, solve_collision_time};
use super::particle::Particle;
use crate::color::{Color, add, fill};
use crate::effects::{BoxedEffect, Effect, EffectKind};

/// Effect that simulates and renders a set of particles
///
/// Particles are kept in ascending id order. Once every particle has died the
/// engine goes inert and reports itself static so its layer is retired.
#[derive(Debug)]
pub struct PhysicsEngine {
    particles: Vec<Particle>,
    spawned: Vec<Particle>,
    next_id: EntityId,
    inert: bool,
}

impl PhysicsEngine {
    pub fn new(particles: Vec<Particle>) -> Self {
        let mut engine = Self {
            particles: Vec::with_capacity(particles.len()),
            spawned: Vec::new(),
            next_id: 0,
            inert: false,
        };
        for particle in particles {
            engine.admit(particle);
        }
        engine
    }

    /// Queue a particle; it joins at the start of the next tick
    pub fn spawn(&mut self, particle: Particle) {
        self.spawned.push(particle);
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Fresh engine over copies of the live particles, with ids reassigned
    pub fn clone_engine(&self) -> PhysicsEngine {
        PhysicsEngine::new(self.particles.iter().map(Particle::clone_particle).collect())
    }

    fn admit(&mut self, mut particle: Particle) {
        particle.entity.id = self.next_id;
        self.next_id += 1;
        self.particles.push(particle);
    }

    fn integrate(&mut self, dt: f64) {
        for particle in &mut self.particles {
            particle.entity.body.tick(dt);
            particle.entity.collisions.clear();
        }
    }

    /// Solve every collidable pair once and record the event on both sides
    fn detect_collisions(&mut self, dt: f64) {
        let n = self.particles.len();
        for i in 0..n {
            let (head, tail) = self.particles.split_at_mut(i + 1);
            let a = &mut head[i];
            if !a.entity.alive || !a.entity.collidable {
                continue;
            }
            for b in tail.iter_mut() {
                if !b.entity.alive || !b.entity.collidable {
                    continue;
                }
                let Some(time) = solve_collision_time(
                    &a.entity.body.previous(),
                    &b.entity.body.previous(),
                    dt,
                ) else {
                    continue;
                };
                let at_a = a.entity.body.state_at(time);
                let at_b = b.entity.body.state_at(time);
                log::debug!(
                    "Collision between {} and {} at t={time:.4} x={:.2}",
                    a.entity.id,
                    b.entity.id,
                    at_a.position
                );
                a.entity.collisions.insert(
                    b.entity.id,
                    CollisionEvent {
                        other: b.entity.id,
                        other_tags: b.entity.tags.clone(),
                        time,
                        step: dt,
                        own_at_impact: at_a,
                        other_at_impact: at_b,
                    },
                );
                b.entity.collisions.insert(
                    a.entity.id,
                    CollisionEvent {
                        other: a.entity.id,
                        other_tags: a.entity.tags.clone(),
                        time,
                        step: dt,
                        own_at_impact: at_b,
                        other_at_impact: at_a,
                    },
                );
            }
        }
    }

    fn render(&self, pixels: &mut [Color]) {
        fill(pixels, Color::TRANSPARENT);
        let n = pixels.len();
        for particle in &self.particles {
            for x in particle.footprint(n) {
                let splat = particle.sample(particle.position() - x as f64);
                pixels[x] = add(pixels[x], splat);
            }
        }
    }
}

impl Effect for PhysicsEngine {
    fn kind(&self) -> EffectKind {
        if self.inert {
            EffectKind::Static
        } else {
            EffectKind::Dynamic
        }
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        if self.inert {
            return;
        }
        for particle in std::mem::take(&mut self.spawned) {
            self.admit(particle);
        }

        let frame = pixels.to_vec();
        self.integrate(dt);
        self.detect_collisions(dt);

        let mut spawner = Spawner::default();
        for particle in &mut self.particles {
            particle.refresh_sprite(&frame, dt);
            particle.run_behaviors(&mut spawner, dt);
        }

        self.particles.retain(|p| p.entity.alive);
        // Spawned particles are drawn on the tick they appear
        for mut particle in spawner.drain() {
            particle.refresh_sprite(&frame, 0.0);
            self.admit(particle);
        }

        self.render(pixels);

        if self.particles.is_empty() && self.spawned.is_empty() {
            log::info!("Physics engine has no particles left, going inert");
            self.inert = true;
        }
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(self.clone_engine())
    }
}
