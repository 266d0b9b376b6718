//! Collision tags
//!
//! Tags compare by label only. A counting tag hands every copy a new label
//! drawn from a counter shared with the tag it was copied from.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

#[derive(Debug, Clone)]
struct Counter {
    prefix: String,
    next: Arc<AtomicU64>,
}

/// Label attached to physics entities for collision filtering
#[derive(Debug, Clone)]
pub struct Tag {
    label: String,
    counter: Option<Counter>,
}

pub type TagSet = BTreeSet<Tag>;

impl Tag {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            counter: None,
        }
    }

    /// Tag labelled `{prefix}{start}`; copies continue with `start + 1`, ...
    pub fn counting(prefix: impl Into<String>, start: u64) -> Self {
        let prefix = prefix.into();
        Self {
            label: format!("{prefix}{start}"),
            counter: Some(Counter {
                prefix,
                next: Arc::new(AtomicU64::new(start + 1)),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Copy for a new entity
    pub fn fork(&self) -> Tag {
        match &self.counter {
            None => self.clone(),
            Some(counter) => {
                let n = counter.next.fetch_add(1, AtomicOrdering::SeqCst);
                Tag {
                    label: format!("{}{n}", counter.prefix),
                    counter: Some(counter.clone()),
                }
            }
        }
    }
}

/// Fork every tag in a set
pub fn fork_all(tags: &TagSet) -> TagSet {
    tags.iter().map(Tag::fork).collect()
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl Eq for Tag {}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label.cmp(&other.label)
    }
}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
    }
}
