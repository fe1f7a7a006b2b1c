//! current_prolog_flag/2 and set_prolog_flag/2.

use std::sync::Arc;

use super::{atom_arg, Alternative, Enumerate};
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::flags::FLAG_NAMES;
use crate::backend::interpreter::Interpreter;
use crate::backend::models::{Tag, Term};
use crate::backend::registry::PredicateRegistry;
use crate::backend::symbol::intern;

pub(super) fn register(registry: &PredicateRegistry) {
    registry.register(
        Tag::of("current_prolog_flag", 2),
        Arc::new(Enumerate::new("current_prolog_flag", current_flag)),
    );
    registry.register_det("set_prolog_flag", 2, set_flag);
}

fn current_flag(interp: &mut Interpreter, args: &[Term]) -> EngineResult<Vec<Alternative>> {
    match interp.deref(&args[0]) {
        Term::Var(_) => Ok(FLAG_NAMES
            .iter()
            .filter_map(|name| {
                let atom = intern(name);
                let value = interp.flags().get(atom)?;
                Some(vec![(args[0].clone(), Term::Atom(atom)), (args[1].clone(), value)])
            })
            .collect()),
        Term::Atom(name) => match interp.flags().get(name) {
            Some(value) => Ok(vec![vec![(args[1].clone(), value)]]),
            None => Err(EngineError::domain_error("prolog_flag", Term::Atom(name))),
        },
        other => Err(EngineError::type_error("atom", other)),
    }
}

fn set_flag(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let name = atom_arg(interp, &args[0])?;
    let value = interp.deref(&args[1]);
    if value.is_var() {
        return Err(EngineError::instantiation());
    }
    interp.flags_mut().set(name, &value)?;
    Ok(true)
}
