//! Predicate registry: the table of built-in and host-provided predicates.
//!
//! Entries are keyed by [`Tag`] and shared by every execution context of an
//! engine. Registering or removing an entry publishes a redefinition so
//! contexts re-resolve the tag on their next call.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::backend::models::Tag;
use crate::backend::predicate::{DetFn, Deterministic, Predicate};
use crate::backend::redefinition::RedefinitionHub;

pub struct PredicateRegistry {
    predicates: DashMap<Tag, Arc<dyn Predicate>>,
    hub: Arc<RedefinitionHub>,
}

impl std::fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("predicate_count", &self.predicates.len())
            .finish()
    }
}

impl PredicateRegistry {
    /// Create an empty registry publishing into `hub`
    pub fn new(hub: Arc<RedefinitionHub>) -> Self {
        PredicateRegistry {
            predicates: DashMap::new(),
            hub,
        }
    }

    /// Create a registry with the standard built-ins installed
    pub fn with_builtins(hub: Arc<RedefinitionHub>) -> Self {
        let registry = Self::new(hub);
        crate::backend::builtins::register_all(&registry);
        registry
    }

    /// Register (or replace) the predicate for `tag`.
    pub fn register(&self, tag: Tag, predicate: Arc<dyn Predicate>) {
        let replaced = self.predicates.insert(tag, predicate).is_some();
        if replaced {
            debug!(target: "prologtron::registry", %tag, "predicate replaced");
        }
        self.hub.publish(tag);
    }

    /// Register a deterministic built-in implemented by a plain function
    pub fn register_det(&self, name: &'static str, arity: u32, func: DetFn) {
        self.register(Tag::of(name, arity), Arc::new(Deterministic::new(name, func)));
    }

    pub fn unregister(&self, tag: Tag) -> Option<Arc<dyn Predicate>> {
        let removed = self.predicates.remove(&tag).map(|(_, p)| p);
        if removed.is_some() {
            self.hub.publish(tag);
        }
        removed
    }

    #[inline]
    pub fn get(&self, tag: Tag) -> Option<Arc<dyn Predicate>> {
        self.predicates.get(&tag).map(|entry| Arc::clone(entry.value()))
    }

    #[inline]
    pub fn contains(&self, tag: Tag) -> bool {
        self.predicates.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Every registered tag, sorted
    pub fn tags(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self.predicates.iter().map(|e| *e.key()).collect();
        tags.sort();
        tags
    }
}
