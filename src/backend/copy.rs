//! Term traversal utilities: resolution, renaming copy, variable collection.
//!
//! All traversals use an explicit work stack, so long lists and deeply nested
//! terms do not grow the native stack.

use std::collections::HashSet;
use std::sync::Arc;

use crate::backend::errors::EngineResult;
use crate::backend::models::template::{detach, substitute};
use crate::backend::models::{Compound, Term, VarId};
use crate::backend::store::Store;
use crate::backend::symbol::Atom;

enum Work<'a> {
    Visit(&'a Term),
    Build(Atom, usize),
}

/// Rebuild `term` with every binding substituted and every unbound variable
/// replaced by `on_var(id)`.
pub fn rebuild<F>(store: &Store, term: &Term, on_var: &mut F) -> Term
where
    F: FnMut(VarId) -> Term,
{
    let mut work = vec![Work::Visit(term)];
    let mut out: Vec<Term> = Vec::new();
    while let Some(item) = work.pop() {
        match item {
            Work::Visit(t) => match store.deref(t) {
                Term::Var(id) => out.push(on_var(*id)),
                Term::Compound(c) => {
                    work.push(Work::Build(c.functor(), c.arity()));
                    for arg in c.args().iter().rev() {
                        work.push(Work::Visit(arg));
                    }
                }
                atomic => out.push(atomic.clone()),
            },
            Work::Build(functor, arity) => {
                let args = out.split_off(out.len() - arity);
                out.push(build_compound(functor, args));
            }
        }
    }
    out.pop().unwrap_or_else(|| term.clone())
}

fn build_compound(functor: Atom, args: Vec<Term>) -> Term {
    // Arity is taken from an existing compound, so it is never zero.
    match Compound::new(functor, args) {
        Ok(c) => Term::Compound(Arc::new(c)),
        Err(_) => Term::Atom(functor),
    }
}

/// Fully dereference `term`: bound variables are replaced by their values,
/// unbound ones are kept.
pub fn resolve(store: &Store, term: &Term) -> Term {
    rebuild(store, term, &mut Term::Var)
}

/// Copy `term` renaming each distinct unbound variable to a fresh one.
/// Sharing between occurrences of the same variable is preserved.
pub fn copy_term(store: &mut Store, term: &Term) -> EngineResult<Term> {
    let (detached, count) = detach(store, term);
    if count == 0 {
        return Ok(detached);
    }
    let fresh = store.fresh_vars(count as usize)?;
    Ok(substitute(&detached, &fresh))
}

/// Distinct unbound variables of `term`, depth-first left-to-right.
pub fn term_variables(store: &Store, term: &Term) -> Vec<VarId> {
    let mut seen = HashSet::new();
    let mut vars = Vec::new();
    let mut work = vec![term];
    while let Some(t) = work.pop() {
        match store.deref(t) {
            Term::Var(id) => {
                if seen.insert(*id) {
                    vars.push(*id);
                }
            }
            Term::Compound(c) => work.extend(c.args().iter().rev()),
            _ => {}
        }
    }
    vars
}

pub fn is_ground(store: &Store, term: &Term) -> bool {
    let mut work = vec![term];
    while let Some(t) = work.pop() {
        match store.deref(t) {
            Term::Var(_) => return false,
            Term::Compound(c) => work.extend(c.args().iter()),
            _ => {}
        }
    }
    true
}

/// Does unbound variable `id` occur in `term`?
pub fn occurs_in(store: &Store, id: VarId, term: &Term) -> bool {
    let mut work = vec![term];
    while let Some(t) = work.pop() {
        match store.deref(t) {
            Term::Var(other) if *other == id => return true,
            Term::Compound(c) => work.extend(c.args().iter()),
            _ => {}
        }
    }
    false
}
