//! Redefinition notifications.
//!
//! Execution contexts cache the predicate they resolved for each tag. When a
//! registry entry or database procedure changes, the hub notifies every
//! listener subscribed to that tag so it can drop its cached entry before its
//! next dispatch. Listeners are held weakly and pruned once dropped.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::trace;

use crate::backend::models::Tag;

/// Receives change notifications for subscribed tags
pub trait RedefinitionListener: Send + Sync {
    fn predicate_changed(&self, tag: Tag);
}

#[derive(Default)]
pub struct RedefinitionHub {
    subscribers: DashMap<Tag, Vec<Weak<dyn RedefinitionListener>>>,
}

impl std::fmt::Debug for RedefinitionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedefinitionHub")
            .field("tags", &self.subscribers.len())
            .finish()
    }
}

impl RedefinitionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, tag: Tag, listener: &Arc<dyn RedefinitionListener>) {
        self.subscribers
            .entry(tag)
            .or_default()
            .push(Arc::downgrade(listener));
    }

    /// Notify every live subscriber of `tag`.
    ///
    /// Listeners run after the subscriber list is released, so a listener may
    /// itself subscribe or publish.
    pub fn publish(&self, tag: Tag) {
        let live: Vec<Arc<dyn RedefinitionListener>> = match self.subscribers.get_mut(&tag) {
            Some(mut entry) => {
                entry.retain(|w| w.strong_count() > 0);
                entry.iter().filter_map(Weak::upgrade).collect()
            }
            None => return,
        };
        trace!(target: "prologtron::redefinition", %tag, listeners = live.len(), "publish");
        for listener in live {
            listener.predicate_changed(tag);
        }
    }

    /// Number of live subscriptions for `tag`
    pub fn subscriber_count(&self, tag: Tag) -> usize {
        self.subscribers
            .get(&tag)
            .map(|entry| entry.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }
}
