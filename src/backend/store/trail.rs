use crate::backend::models::{Term, VarId};

use super::Store;

/// Position in the trail taken by [`Trail::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TrailMark(usize);

impl TrailMark {
    #[inline]
    pub fn position(self) -> usize {
        self.0
    }
}

/// Append-only log of bound variables.
#[derive(Debug, Default)]
pub struct Trail {
    entries: Vec<VarId>,
}

impl Trail {
    pub fn new() -> Self {
        Trail {
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn mark(&self) -> TrailMark {
        TrailMark(self.entries.len())
    }

    /// Bind an unbound variable and record it.
    #[inline]
    pub fn bind(&mut self, store: &mut Store, id: VarId, value: Term) {
        debug_assert!(!store.is_bound(id), "rebinding bound variable {:?}", id);
        store.set(id, Some(value));
        self.entries.push(id);
    }

    /// Reset every variable bound after `mark`, newest first.
    pub fn undo_to(&mut self, mark: TrailMark, store: &mut Store) {
        while self.entries.len() > mark.0 {
            if let Some(id) = self.entries.pop() {
                store.set(id, None);
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
