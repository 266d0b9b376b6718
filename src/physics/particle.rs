//! Physics entities and the Gaussian-splat particles built on them

use std::collections::BTreeMap;

use super::behavior::{BoxedBehavior, Spawner};
use super::body::PhysicsBody;
use super::collision::{CollisionEvent, EntityId};
use super::tag::{Tag, TagSet, fork_all};
use crate::color::{Color, resize_clone, scalar_multiply};
use crate::consts::{GAUSSIAN_CUTOFF, SPRITE_EXTRA_SAMPLES, SPRITE_SAMPLES_PER_RADIUS};
use crate::effects::{BoxedEffect, EffectKind, Fill};
use crate::error::{Result, non_negative};

/// Body plus the bookkeeping the engine needs for collisions
#[derive(Debug)]
pub struct PhysicsEntity {
    /// Assigned by the engine when the entity joins it
    pub id: EntityId,
    pub body: PhysicsBody,
    pub alive: bool,
    pub collidable: bool,
    pub tags: TagSet,
    /// Collisions from the current tick, keyed by the other entity
    pub collisions: BTreeMap<EntityId, CollisionEvent>,
}

impl PhysicsEntity {
    pub fn new(body: PhysicsBody) -> Self {
        Self {
            id: 0,
            body,
            alive: true,
            collidable: false,
            tags: TagSet::new(),
            collisions: BTreeMap::new(),
        }
    }

    pub fn has_collision(&self) -> bool {
        !self.collisions.is_empty()
    }

    /// Copy with a respawned body, forked tags and no collisions
    fn respawn(&self) -> Self {
        Self {
            id: 0,
            body: self.body.respawn(),
            alive: true,
            collidable: self.collidable,
            tags: fork_all(&self.tags),
            collisions: BTreeMap::new(),
        }
    }
}

/// A glowing blob rendered with a Gaussian falloff from a child effect's colors
#[derive(Debug)]
pub struct Particle {
    pub entity: PhysicsEntity,
    effect: BoxedEffect,
    radius: f64,
    pub brightness: f64,
    /// Behaviors as configured, cloned for every copy of the particle
    templates: Vec<BoxedBehavior>,
    behaviors: Vec<BoxedBehavior>,
    pending: Vec<BoxedBehavior>,
    sprite: Vec<Color>,
}

impl Particle {
    pub fn new(effect: BoxedEffect, body: PhysicsBody, radius: f64) -> Result<Self> {
        Ok(Self {
            entity: PhysicsEntity::new(body),
            effect,
            radius: non_negative("radius", radius)?,
            brightness: 1.0,
            templates: Vec::new(),
            behaviors: Vec::new(),
            pending: Vec::new(),
            sprite: Vec::new(),
        })
    }

    /// Invisible collidable entity, for walls and triggers
    pub fn collider(body: PhysicsBody, tags: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            entity: PhysicsEntity::new(body),
            effect: Box::new(Fill::solid(Color::TRANSPARENT)),
            radius: 0.0,
            brightness: 1.0,
            templates: Vec::new(),
            behaviors: Vec::new(),
            pending: Vec::new(),
            sprite: Vec::new(),
        }
        .collidable(true)
        .with_tags(tags)
    }

    pub fn with_behaviors(mut self, behaviors: Vec<BoxedBehavior>) -> Self {
        self.behaviors = behaviors.iter().map(|b| b.clone_behavior()).collect();
        self.templates = behaviors;
        self
    }

    pub fn collidable(mut self, collidable: bool) -> Self {
        self.entity.collidable = collidable;
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.entity.tags.extend(tags);
        self
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn position(&self) -> f64 {
        self.entity.body.position
    }

    /// Attach a behavior; it starts running from the next tick
    pub fn add_behavior(&mut self, behavior: BoxedBehavior) {
        self.pending.push(behavior);
    }

    /// Fresh copy: cloned effect, respawned body, forked tags, initial behaviors
    pub fn clone_particle(&self) -> Particle {
        Particle {
            entity: self.entity.respawn(),
            effect: self.effect.clone_effect(),
            radius: self.radius,
            brightness: 1.0,
            templates: self.templates.iter().map(|b| b.clone_behavior()).collect(),
            behaviors: self.templates.iter().map(|b| b.clone_behavior()).collect(),
            pending: Vec::new(),
            sprite: Vec::new(),
        }
    }

    /// Re-render the color sprite from the engine's input frame when it is
    /// missing, too coarse for the frame, or driven by a dynamic effect
    pub(crate) fn refresh_sprite(&mut self, frame: &[Color], dt: f64) {
        let wanted = frame
            .len()
            .min((SPRITE_SAMPLES_PER_RADIUS * self.radius + SPRITE_EXTRA_SAMPLES).ceil() as usize);
        if self.sprite.len() >= wanted && self.effect.kind() == EffectKind::Static {
            return;
        }
        self.sprite = resize_clone(frame, wanted);
        self.effect.tick(&mut self.sprite, dt);
    }

    /// Run every behavior once, then fold in behaviors attached meanwhile and
    /// drop the dead ones
    pub(crate) fn run_behaviors(&mut self, spawner: &mut Spawner, dt: f64) {
        let mut behaviors = std::mem::take(&mut self.behaviors);
        for behavior in behaviors.iter_mut() {
            behavior.tick(spawner, self, dt);
        }
        behaviors.append(&mut self.pending);
        behaviors.retain(|b| b.is_alive());
        self.behaviors = behaviors;
    }

    /// Color contributed at signed distance `dx` from the particle's center
    pub fn sample(&self, dx: f64) -> Color {
        let r = self.radius;
        if r <= 0.0 || dx.abs() >= GAUSSIAN_CUTOFF * r || self.sprite.is_empty() {
            return Color::TRANSPARENT;
        }
        let last = self.sprite.len() - 1;
        let weight = (-(dx * dx) / (2.0 * r * r)).exp() * last as f64;
        // Tails below one sprite step contribute nothing
        if weight < 1.0 {
            return Color::TRANSPARENT;
        }
        let index = last - (weight as usize).min(last);
        scalar_multiply(self.brightness, self.sprite[index], true)
    }

    /// Pixel range touched by this particle's splat
    pub(crate) fn footprint(&self, n: usize) -> std::ops::Range<usize> {
        let reach = GAUSSIAN_CUTOFF * self.radius;
        let left = (self.position() - reach).floor().max(0.0) as usize;
        let right = ((self.position() + reach).ceil() + 1.0).clamp(0.0, n as f64) as usize;
        left.min(right)..right
    }
}
