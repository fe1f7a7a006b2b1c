//! Term construction and inspection: functor/3, arg/3, =../2, copy_term/2,
//! term_variables/2.

use std::sync::Arc;

use super::{integer_arg, Alternative, Enumerate};
use crate::backend::copy::{copy_term, term_variables};
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::list::{list_from_vec, list_shape, ListShape};
use crate::backend::models::{Tag, Term};
use crate::backend::registry::PredicateRegistry;

pub(super) fn register(registry: &PredicateRegistry) {
    registry.register_det("functor", 3, functor);
    registry.register(Tag::of("arg", 3), Arc::new(Enumerate::new("arg", arg)));
    registry.register_det("=..", 2, univ);
    registry.register_det("copy_term", 2, |interp, args| {
        let copy = copy_term(&mut interp.store, &args[0])?;
        Ok(interp.unify(&args[1], &copy))
    });
    registry.register_det("term_variables", 2, |interp, args| {
        let vars: Vec<Term> = term_variables(interp.store(), &args[0])
            .into_iter()
            .map(Term::Var)
            .collect();
        Ok(interp.unify(&args[1], &list_from_vec(vars)))
    });
}

/// Build `name(_, ..., _)` with `arity` fresh arguments.
fn skeleton(interp: &mut Interpreter, name: &Term, arity: usize) -> EngineResult<Term> {
    if arity == 0 {
        return Ok(name.clone());
    }
    if arity > interp.flags().max_arity {
        return Err(EngineError::representation_error("max_arity"));
    }
    match name {
        Term::Atom(functor) => {
            let args = interp.store.fresh_vars(arity)?;
            Ok(Term::app_atom(*functor, args))
        }
        Term::Compound(_) => Err(EngineError::type_error("atomic", name.clone())),
        other => Err(EngineError::type_error("atom", other.clone())),
    }
}

fn functor(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    match interp.deref(&args[0]) {
        Term::Var(_) => {
            let name = interp.deref(&args[1]);
            if name.is_var() {
                return Err(EngineError::instantiation());
            }
            let arity = integer_arg(interp, &args[2])?;
            if arity < 0 {
                return Err(EngineError::domain_error("not_less_than_zero", Term::Integer(arity)));
            }
            if matches!(name, Term::Compound(_)) {
                return Err(EngineError::type_error("atomic", name));
            }
            let term = skeleton(interp, &name, arity as usize)?;
            Ok(interp.unify(&args[0], &term))
        }
        Term::Compound(c) => {
            let arity = Term::Integer(c.arity() as i64);
            Ok(interp.unify(&args[1], &Term::Atom(c.functor())) && interp.unify(&args[2], &arity))
        }
        atomic => Ok(interp.unify(&args[1], &atomic) && interp.unify(&args[2], &Term::Integer(0))),
    }
}

/// arg/3; enumerates the argument positions when `N` is unbound.
fn arg(interp: &mut Interpreter, args: &[Term]) -> EngineResult<Vec<Alternative>> {
    let term = match interp.deref(&args[1]) {
        Term::Var(_) => return Err(EngineError::instantiation()),
        Term::Compound(c) => c,
        other => return Err(EngineError::type_error("compound", other)),
    };
    match interp.deref(&args[0]) {
        Term::Var(_) => Ok(term
            .args()
            .iter()
            .enumerate()
            .map(|(i, a)| {
                vec![
                    (args[0].clone(), Term::Integer(i as i64 + 1)),
                    (args[2].clone(), a.clone()),
                ]
            })
            .collect()),
        Term::Integer(n) => {
            let picked = usize::try_from(n)
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| term.arg(i));
            Ok(picked
                .map(|a| vec![vec![(args[2].clone(), a.clone())]])
                .unwrap_or_default())
        }
        Term::BigInteger(_) => Ok(Vec::new()),
        other => Err(EngineError::type_error("integer", other)),
    }
}

/// `Term =.. [Name | Args]`
fn univ(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    match interp.deref(&args[0]) {
        Term::Var(_) => {}
        Term::Compound(c) => {
            let mut items = Vec::with_capacity(c.arity() + 1);
            items.push(Term::Atom(c.functor()));
            items.extend_from_slice(c.args());
            return Ok(interp.unify(&args[1], &list_from_vec(items)));
        }
        atomic => return Ok(interp.unify(&args[1], &list_from_vec(vec![atomic]))),
    }

    let items = match list_shape(interp.store(), &args[1]) {
        ListShape::Proper(items) => items,
        ListShape::Partial(..) => return Err(EngineError::instantiation()),
        ListShape::NotList => {
            return Err(EngineError::type_error("list", interp.resolve(&args[1])))
        }
    };
    let Some((head, rest)) = items.split_first() else {
        return Err(EngineError::domain_error("non_empty_list", Term::nil()));
    };
    let term = match head {
        Term::Var(_) => return Err(EngineError::instantiation()),
        _ if rest.is_empty() => {
            if matches!(head, Term::Compound(_)) {
                return Err(EngineError::type_error("atomic", head.clone()));
            }
            head.clone()
        }
        Term::Atom(name) => {
            if rest.len() > interp.flags().max_arity {
                return Err(EngineError::representation_error("max_arity"));
            }
            Term::app_atom(*name, rest.to_vec())
        }
        Term::Compound(_) => return Err(EngineError::type_error("atomic", head.clone())),
        other => return Err(EngineError::type_error("atom", other.clone())),
    };
    Ok(interp.unify(&args[0], &term))
}
