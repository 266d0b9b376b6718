//! Particle physics
//!
//! One-dimensional bodies moving along the strip, with exact sub-step
//! collision times, pluggable particle behaviors and Gaussian rendering.
//! Entities are processed in ascending id order so a run is reproducible
//! given seeded randomness.

pub mod behavior;
pub mod body;
pub mod collision;
pub mod engine;
pub mod particle;
pub mod tag;

pub use behavior::{
    Behavior, BoxedBehavior, Collision, Decay, Emitter, Explosion, Impulse, Lifetime,
    RigidCollider, Spawner,
};
pub use body::{BodyState, PhysicsBody, SpawnRanges};
pub use collision::{CollisionEvent, EntityId, solve_collision_time};
pub use engine::PhysicsEngine;
pub use particle::{Particle, PhysicsEntity};
pub use tag::{Tag, TagSet};
