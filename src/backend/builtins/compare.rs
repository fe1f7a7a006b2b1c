//! Standard order of terms: ==, \==, @<, @>, @=<, @>= and compare/3.

use std::cmp::Ordering;

use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::Term;
use crate::backend::order::compare;
use crate::backend::registry::PredicateRegistry;
use crate::backend::symbol::atoms;

pub(super) fn register(registry: &PredicateRegistry) {
    registry.register_det("==", 2, |i, a| Ok(order(i, a) == Ordering::Equal));
    registry.register_det("\\==", 2, |i, a| Ok(order(i, a) != Ordering::Equal));
    registry.register_det("@<", 2, |i, a| Ok(order(i, a) == Ordering::Less));
    registry.register_det("@>", 2, |i, a| Ok(order(i, a) == Ordering::Greater));
    registry.register_det("@=<", 2, |i, a| Ok(order(i, a) != Ordering::Greater));
    registry.register_det("@>=", 2, |i, a| Ok(order(i, a) != Ordering::Less));
    registry.register_det("compare", 3, compare3);
}

#[inline]
fn order(interp: &Interpreter, args: &[Term]) -> Ordering {
    compare(interp.store(), &args[0], &args[1])
}

pub(super) fn order_atom(ord: Ordering) -> Term {
    let a = atoms();
    Term::Atom(match ord {
        Ordering::Less => a.less,
        Ordering::Equal => a.equals,
        Ordering::Greater => a.greater,
    })
}

fn compare3(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    match interp.deref(&args[0]) {
        Term::Var(_) => {}
        Term::Atom(name) if matches!(name.as_str(), "<" | "=" | ">") => {}
        Term::Atom(_) => {
            return Err(EngineError::domain_error("order", interp.deref(&args[0])));
        }
        other => return Err(EngineError::type_error("atom", other)),
    }
    let ord = order_atom(compare(interp.store(), &args[1], &args[2]));
    Ok(interp.unify(&args[0], &ord))
}
