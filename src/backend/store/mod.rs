//! Variable arena and trail.
//!
//! Every variable of an execution context is a cell in the [`Store`].
//! Bindings are made through the [`Trail`] so they can be undone on
//! backtracking. Cells are allocated at the end of the arena and released
//! by [`Store::truncate`] when execution backtracks past the point where
//! they were created.

mod trail;

pub use trail::{Trail, TrailMark};

use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::models::{Term, VarId};

/// Arena of variable cells. `None` means unbound.
#[derive(Debug, Default)]
pub struct Store {
    cells: Vec<Option<Term>>,
}

impl Store {
    pub fn new() -> Self {
        Store { cells: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Store {
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Allocate a fresh unbound variable
    #[inline]
    pub fn fresh_var(&mut self) -> EngineResult<Term> {
        let id = cell_id(self.cells.len())?;
        self.cells.push(None);
        Ok(Term::Var(VarId(id)))
    }

    /// Allocate `n` fresh variables
    pub fn fresh_vars(&mut self, n: usize) -> EngineResult<Vec<Term>> {
        let start = cell_id(self.cells.len())?;
        let end = self
            .cells
            .len()
            .checked_add(n)
            .ok_or_else(|| EngineError::resource_error("memory"))
            .and_then(cell_id)?;
        self.cells.resize(self.cells.len() + n, None);
        Ok((start..end).map(|i| Term::Var(VarId(i))).collect())
    }

    /// Current binding of `id`; ids outside the arena read as unbound.
    #[inline]
    pub fn binding(&self, id: VarId) -> Option<&Term> {
        self.cells.get(id.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn is_bound(&self, id: VarId) -> bool {
        self.binding(id).is_some()
    }

    /// Follow variable bindings until a non-variable or an unbound variable.
    #[inline]
    pub fn deref<'a>(&'a self, mut term: &'a Term) -> &'a Term {
        while let Term::Var(id) = term {
            match self.binding(*id) {
                Some(next) => term = next,
                None => break,
            }
        }
        term
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Drop every cell. Only valid when no live term refers into the arena.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Release the cells allocated after the arena had `len` cells. Their
    /// bindings must already be undone and no live term may refer to them.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.cells.truncate(len);
    }

    #[inline]
    pub(crate) fn set(&mut self, id: VarId, value: Option<Term>) {
        if let Some(cell) = self.cells.get_mut(id.index()) {
            *cell = value;
        }
    }
}

/// Id of the cell at `index`; ids are `u32`, so the arena stops there.
fn cell_id(index: usize) -> EngineResult<u32> {
    u32::try_from(index).map_err(|_| EngineError::resource_error("memory"))
}
