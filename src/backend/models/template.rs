//! Detached clause and goal templates.
//!
//! A template is a term whose variables have been renumbered to the local
//! range `0..var_count` and which shares no cells with any execution
//! context, so it can be stored in the shared database and instantiated
//! into any [`Store`].

use std::collections::HashMap;

use crate::backend::copy::rebuild;
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::store::Store;
use crate::backend::symbol::atoms;

use super::{Tag, Term, VarId};

/// A stored clause `Head :- Body` (facts carry the body `true`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClauseTemplate {
    head: Term,
    body: Term,
    var_count: u32,
}

impl ClauseTemplate {
    /// Build a template from a term written with clause-local variables.
    ///
    /// Accepts `Head :- Body` or a bare `Head`. Variable ids are compacted to
    /// `0..n` in first-occurrence order; no store is consulted.
    pub fn new(clause: Term) -> EngineResult<Self> {
        let mut renumber = Renumber::default();
        let clause = rebuild_local(&clause, &mut renumber);
        Self::from_renumbered(clause, renumber.count)
    }

    /// Detach a live term: resolve it against `store` and renumber the
    /// remaining unbound variables.
    pub fn from_live(store: &Store, clause: &Term) -> EngineResult<Self> {
        let (term, count) = detach(store, clause);
        Self::from_renumbered(term, count)
    }

    fn from_renumbered(clause: Term, var_count: u32) -> EngineResult<Self> {
        let (head, body) = match &clause {
            Term::Compound(c) if c.arity() == 2 && c.functor() == atoms().clause => {
                (c.args()[0].clone(), c.args()[1].clone())
            }
            _ => (clause.clone(), Term::Atom(atoms().true_)),
        };
        match &head {
            Term::Var(_) => return Err(EngineError::instantiation()),
            Term::Atom(_) | Term::Compound(_) => {}
            other => return Err(EngineError::type_error("callable", other.clone())),
        }
        if let Some(culprit) = first_non_callable(&body) {
            return Err(EngineError::type_error("callable", culprit));
        }
        Ok(ClauseTemplate {
            head,
            body,
            var_count,
        })
    }

    #[inline]
    pub fn head(&self) -> &Term {
        &self.head
    }

    #[inline]
    pub fn body(&self) -> &Term {
        &self.body
    }

    #[inline]
    pub fn var_count(&self) -> u32 {
        self.var_count
    }

    pub fn tag(&self) -> Tag {
        // The head is validated callable at construction.
        self.head
            .callable_tag()
            .unwrap_or_else(|| Tag::new(atoms().true_, 0))
    }

    /// `Head :- Body` as a template term
    pub fn as_term(&self) -> Term {
        Term::app_atom(atoms().clause, vec![self.head.clone(), self.body.clone()])
    }

    /// Instantiate into `store`: every local variable becomes a fresh cell.
    /// Returns `(head, body)`.
    pub fn instantiate(&self, store: &mut Store) -> EngineResult<(Term, Term)> {
        let fresh = store.fresh_vars(self.var_count as usize)?;
        let subst = |t: &Term| substitute(t, &fresh);
        Ok((subst(&self.head), subst(&self.body)))
    }
}

#[derive(Default)]
struct Renumber {
    map: HashMap<VarId, VarId>,
    count: u32,
}

impl Renumber {
    fn local(&mut self, id: VarId) -> Term {
        let next = self.count;
        let local = *self.map.entry(id).or_insert_with(|| VarId(next));
        if local.0 == next {
            self.count += 1;
        }
        Term::Var(local)
    }
}

fn rebuild_local(term: &Term, renumber: &mut Renumber) -> Term {
    let empty = Store::new();
    rebuild(&empty, term, &mut |id| renumber.local(id))
}

/// Resolve `term` against `store` and renumber its unbound variables to the
/// local range. Returns the detached term and its variable count.
pub fn detach(store: &Store, term: &Term) -> (Term, u32) {
    let (term, vars) = detach_with_vars(store, term);
    (term, vars.len() as u32)
}

/// Like [`detach`], also returning the live variables in local order so the
/// caller can map local slot `i` back to `vars[i]`.
pub fn detach_with_vars(store: &Store, term: &Term) -> (Term, Vec<VarId>) {
    let mut renumber = Renumber::default();
    let mut order = Vec::new();
    let detached = rebuild(store, term, &mut |id| {
        let before = renumber.count;
        let local = renumber.local(id);
        if renumber.count != before {
            order.push(id);
        }
        local
    });
    (detached, order)
}

/// Replace local variable `i` with `fresh[i]`.
pub fn substitute(term: &Term, fresh: &[Term]) -> Term {
    let empty = Store::new();
    rebuild(&empty, term, &mut |id| {
        fresh
            .get(id.index())
            .cloned()
            .unwrap_or(Term::Var(id))
    })
}

/// First subterm of a clause body that cannot be a goal, if any.
fn first_non_callable(body: &Term) -> Option<Term> {
    let a = atoms();
    let mut work = vec![body];
    while let Some(goal) = work.pop() {
        match goal {
            Term::Var(_) | Term::Atom(_) => {}
            Term::Compound(c) => {
                let control = (c.arity() == 2
                    && (c.functor() == a.comma
                        || c.functor() == a.semicolon
                        || c.functor() == a.arrow))
                    || (c.arity() == 1 && c.functor() == a.not_provable);
                if control {
                    work.extend(c.args().iter());
                }
            }
            other => return Some(other.clone()),
        }
    }
    None
}
