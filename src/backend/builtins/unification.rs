//! =/2, \=/2 and unify_with_occurs_check/2.

use crate::backend::errors::EngineResult;
use crate::backend::interpreter::Interpreter;
use crate::backend::models::Term;
use crate::backend::registry::PredicateRegistry;
use crate::backend::unify::unify_with_occurs_check;

pub(super) fn register(registry: &PredicateRegistry) {
    registry.register_det("=", 2, |interp, args| Ok(interp.unify(&args[0], &args[1])));
    registry.register_det("\\=", 2, not_unifiable);
    registry.register_det("unify_with_occurs_check", 2, sound_unify);
}

fn not_unifiable(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let mark = interp.mark();
    let unified = interp.unify(&args[0], &args[1]);
    interp.undo_to(mark);
    Ok(!unified)
}

fn sound_unify(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    Ok(unify_with_occurs_check(
        &mut interp.store,
        &mut interp.trail,
        &args[0],
        &args[1],
    ))
}
