//! Type-testing predicates. None of them bind anything.

use crate::backend::copy::is_ground;
use crate::backend::errors::EngineResult;
use crate::backend::interpreter::Interpreter;
use crate::backend::models::list::proper_list;
use crate::backend::models::Term;
use crate::backend::registry::PredicateRegistry;

pub(super) fn register(registry: &PredicateRegistry) {
    registry.register_det("var", 1, |i, a| test(i, a, Term::is_var));
    registry.register_det("nonvar", 1, |i, a| test(i, a, |t| !t.is_var()));
    registry.register_det("atom", 1, |i, a| test(i, a, Term::is_atom));
    registry.register_det("number", 1, |i, a| test(i, a, Term::is_number));
    registry.register_det("integer", 1, |i, a| test(i, a, Term::is_integer));
    registry.register_det("float", 1, |i, a| test(i, a, |t| matches!(t, Term::Float(_))));
    registry.register_det("rational", 1, |i, a| {
        test(i, a, |t| t.is_integer() || matches!(t, Term::Rational(_)))
    });
    registry.register_det("atomic", 1, |i, a| test(i, a, Term::is_atomic));
    registry.register_det("compound", 1, |i, a| {
        test(i, a, |t| matches!(t, Term::Compound(_)))
    });
    registry.register_det("callable", 1, |i, a| test(i, a, Term::is_callable));
    registry.register_det("is_list", 1, |i, a| Ok(proper_list(i.store(), &a[0]).is_some()));
    registry.register_det("ground", 1, |i, a| Ok(is_ground(i.store(), &a[0])));
}

#[inline]
fn test(interp: &mut Interpreter, args: &[Term], pred: fn(&Term) -> bool) -> EngineResult<bool> {
    Ok(pred(interp.store().deref(&args[0])))
}
