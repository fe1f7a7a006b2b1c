//! Unification over the variable store.
//!
//! Both entry points work through an explicit list of pending pairs. On
//! failure, bindings made before the mismatch remain on the trail; callers
//! undo to a mark they took beforehand.

use crate::backend::copy::occurs_in;
use crate::backend::models::{Term, VarId};
use crate::backend::store::{Store, Trail};

/// Standard unification without the occurs check.
#[inline]
pub fn unify(store: &mut Store, trail: &mut Trail, a: &Term, b: &Term) -> bool {
    unify_terms(store, trail, a, b, false)
}

/// Unification that refuses to bind a variable to a term containing it.
#[inline]
pub fn unify_with_occurs_check(store: &mut Store, trail: &mut Trail, a: &Term, b: &Term) -> bool {
    unify_terms(store, trail, a, b, true)
}

pub fn unify_terms(
    store: &mut Store,
    trail: &mut Trail,
    a: &Term,
    b: &Term,
    occurs_check: bool,
) -> bool {
    let mut pending: Vec<(Term, Term)> = vec![(a.clone(), b.clone())];
    while let Some((left, right)) = pending.pop() {
        let left = store.deref(&left).clone();
        let right = store.deref(&right).clone();
        if left.same_ref(&right) {
            continue;
        }
        match (&left, &right) {
            (Term::Var(x), Term::Var(y)) => {
                // Bind the younger cell to the older one.
                if x > y {
                    trail.bind(store, *x, right.clone());
                } else {
                    trail.bind(store, *y, left.clone());
                }
            }
            (Term::Var(x), _) => {
                if !bind_checked(store, trail, *x, &right, occurs_check) {
                    return false;
                }
            }
            (_, Term::Var(y)) => {
                if !bind_checked(store, trail, *y, &left, occurs_check) {
                    return false;
                }
            }
            (Term::Compound(x), Term::Compound(y)) => {
                if x.functor() != y.functor() || x.arity() != y.arity() {
                    return false;
                }
                pending.extend(
                    x.args()
                        .iter()
                        .cloned()
                        .zip(y.args().iter().cloned())
                        .rev(),
                );
            }
            _ => {
                if !left.atomic_eq(&right) {
                    return false;
                }
            }
        }
    }
    true
}

fn bind_checked(
    store: &mut Store,
    trail: &mut Trail,
    id: VarId,
    value: &Term,
    occurs_check: bool,
) -> bool {
    if occurs_check && occurs_in(store, id, value) {
        return false;
    }
    trail.bind(store, id, value.clone());
    true
}
