//! Effects that control how clones relate to each other

use std::sync::Arc;

use parking_lot::Mutex;

use super::{BoxedEffect, Effect, EffectKind};
use crate::color::Color;

/// Handle to one effect instance observed through every clone
///
/// Each clone ticks the same shared instance. While `reclones` is non-zero,
/// cloning first replaces the shared instance with a fresh copy.
#[derive(Debug)]
pub struct Share {
    shared: Arc<Mutex<BoxedEffect>>,
    reclones: u32,
}

impl Share {
    pub fn new(effect: BoxedEffect, reclones: u32) -> Self {
        Self {
            shared: Arc::new(Mutex::new(effect)),
            reclones,
        }
    }
}

impl Effect for Share {
    fn kind(&self) -> EffectKind {
        self.shared.lock().kind()
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        self.shared.lock().tick(pixels, dt);
    }

    fn clone_effect(&self) -> BoxedEffect {
        let mut reclones = self.reclones;
        if reclones != 0 {
            let mut shared = self.shared.lock();
            *shared = shared.clone_effect();
            reclones -= 1;
        }
        Box::new(Self {
            shared: Arc::clone(&self.shared),
            reclones,
        })
    }
}

/// One generation of a [`Parent`]; remembers its most recent clone
#[derive(Debug)]
struct ParentNode {
    effect: Mutex<BoxedEffect>,
    latest: Mutex<Option<Arc<ParentNode>>>,
}

impl ParentNode {
    fn new(effect: BoxedEffect) -> Arc<Self> {
        Arc::new(Self {
            effect: Mutex::new(effect),
            latest: Mutex::new(None),
        })
    }

    /// Most recent clone of this node, or the node itself
    fn latest(self: &Arc<Self>) -> Arc<Self> {
        self.latest
            .lock()
            .clone()
            .unwrap_or_else(|| Arc::clone(self))
    }
}

/// An effect whose clones are tracked so that [`Child`]ren can follow them
#[derive(Debug)]
pub struct Parent {
    node: Arc<ParentNode>,
}

impl Parent {
    pub fn new(effect: BoxedEffect) -> Self {
        Self {
            node: ParentNode::new(effect),
        }
    }
}

impl Effect for Parent {
    fn kind(&self) -> EffectKind {
        self.node.effect.lock().kind()
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        self.node.effect.lock().tick(pixels, dt);
    }

    fn clone_effect(&self) -> BoxedEffect {
        let node = ParentNode::new(self.node.effect.lock().clone_effect());
        *self.node.latest.lock() = Some(Arc::clone(&node));
        Box::new(Parent { node })
    }
}

/// Plays a copy of a [`Parent`]'s effect; clones copy the parent's latest clone
#[derive(Debug)]
pub struct Child {
    parent: Arc<ParentNode>,
    effect: BoxedEffect,
}

impl Child {
    pub fn new(parent: &Parent) -> Self {
        Self::of(Arc::clone(&parent.node))
    }

    fn of(parent: Arc<ParentNode>) -> Self {
        let effect = parent.effect.lock().clone_effect();
        Self { parent, effect }
    }
}

impl Effect for Child {
    fn kind(&self) -> EffectKind {
        self.effect.kind()
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        self.effect.tick(pixels, dt);
    }

    fn clone_effect(&self) -> BoxedEffect {
        Box::new(Child::of(self.parent.latest()))
    }
}

/// Logs every clone with its generation depth
#[derive(Debug)]
pub struct DebugClone {
    id: String,
    effect: Option<BoxedEffect>,
    depth: u32,
}

impl DebugClone {
    pub fn new(id: impl Into<String>, effect: Option<BoxedEffect>) -> Self {
        Self {
            id: id.into(),
            effect,
            depth: 0,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }
}

impl Effect for DebugClone {
    fn kind(&self) -> EffectKind {
        self.effect
            .as_ref()
            .map_or(EffectKind::Static, |effect| effect.kind())
    }

    fn tick(&mut self, pixels: &mut [Color], dt: f64) {
        if let Some(effect) = self.effect.as_mut() {
            effect.tick(pixels, dt);
        }
    }

    fn clone_effect(&self) -> BoxedEffect {
        let depth = self.depth + 1;
        log::debug!("{} cloned {} time(s)", self.id, depth);
        Box::new(Self {
            id: self.id.clone(),
            effect: self.effect.as_ref().map(|effect| effect.clone_effect()),
            depth,
        })
    }
}
