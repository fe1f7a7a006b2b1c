//! Database built-ins: assert family, retract/1, abolish/1, dynamic/1.
//!
//! Only dynamic procedures may be changed at run time. Asserting to an
//! unknown procedure makes it dynamic; built-ins and procedures loaded as
//! static clauses raise `permission_error(modify, static_procedure, PI)`.

use tracing::debug;

use super::list_arg;
use crate::backend::database::ClausePosition;
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::{ClauseTemplate, Tag, Term};
use crate::backend::registry::PredicateRegistry;
use crate::backend::symbol::atoms;

pub(super) fn register(registry: &PredicateRegistry) {
    registry.register_det("assertz", 1, |i, a| assert_clause(i, &a[0], ClausePosition::Last));
    registry.register_det("assert", 1, |i, a| assert_clause(i, &a[0], ClausePosition::Last));
    registry.register_det("asserta", 1, |i, a| assert_clause(i, &a[0], ClausePosition::First));
    registry.register_det("retract", 1, retract);
    registry.register_det("abolish", 1, abolish);
    registry.register_det("dynamic", 1, dynamic);
}

/// Raise unless `tag` may be changed by the running program.
fn check_modifiable(interp: &Interpreter, tag: Tag) -> EngineResult<()> {
    let engine = interp.engine();
    let database = engine.database();
    let is_static = database.is_defined(tag) && !database.is_dynamic(tag);
    if engine.registry().contains(tag) || is_static {
        return Err(EngineError::permission_error(
            "modify",
            "static_procedure",
            tag.indicator(),
        ));
    }
    Ok(())
}

fn assert_clause(interp: &mut Interpreter, clause: &Term, position: ClausePosition) -> EngineResult<bool> {
    let template = ClauseTemplate::from_live(interp.store(), clause)?;
    let tag = template.tag();
    check_modifiable(interp, tag)?;
    let database = interp.engine().database();
    database.declare_dynamic(tag);
    database.add_clause(template, position);
    Ok(true)
}

/// Remove the first clause unifying with `Head :- Body` (or a fact `Head`).
fn retract(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let clause = interp.deref(&args[0]);
    let (head, body) = match clause.as_compound() {
        Some(c) if c.functor() == atoms().clause && c.arity() == 2 => {
            (c.args()[0].clone(), c.args()[1].clone())
        }
        _ => (clause.clone(), Term::Atom(atoms().true_)),
    };
    let head = super::callable_arg(interp, &head)?;
    let Some(tag) = head.callable_tag() else {
        return Err(EngineError::type_error("callable", head));
    };
    check_modifiable(interp, tag)?;

    let engine = interp.engine().clone();
    let Some(clauses) = engine.database().clauses(tag) else {
        return Ok(false);
    };
    for candidate in clauses {
        let mark = interp.mark();
        let (h, b) = candidate.instantiate(&mut interp.store)?;
        if interp.unify(&head, &h) && interp.unify(&body, &b) && engine.database().remove_clause(tag, &candidate) {
            debug!(target: "prologtron::database", %tag, "clause retracted");
            return Ok(true);
        }
        interp.undo_to(mark);
    }
    Ok(false)
}

/// Parse a predicate indicator `Name/Arity`.
fn indicator(interp: &Interpreter, term: &Term) -> EngineResult<Tag> {
    let term = interp.deref(term);
    let parts = match term.as_compound() {
        _ if term.is_var() => return Err(EngineError::instantiation()),
        Some(c) if c.functor() == atoms().slash && c.arity() == 2 => c.args(),
        _ => return Err(EngineError::type_error("predicate_indicator", term.clone())),
    };
    let name = interp.deref(&parts[0]);
    let arity = interp.deref(&parts[1]);
    if name.is_var() || arity.is_var() {
        return Err(EngineError::instantiation());
    }
    let Term::Atom(name) = name else {
        return Err(EngineError::type_error("atom", name));
    };
    let arity = match arity {
        Term::Integer(n) if n < 0 => {
            return Err(EngineError::domain_error("not_less_than_zero", Term::Integer(n)))
        }
        Term::Integer(n) => n,
        Term::BigInteger(_) => return Err(EngineError::representation_error("max_arity")),
        other => return Err(EngineError::type_error("integer", other)),
    };
    if arity as usize > interp.flags().max_arity {
        return Err(EngineError::representation_error("max_arity"));
    }
    Ok(Tag::new(name, arity as u32))
}

fn abolish(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let tag = indicator(interp, &args[0])?;
    check_modifiable(interp, tag)?;
    interp.engine().database().abolish(tag);
    Ok(true)
}

/// dynamic(PI), dynamic((PI1, PI2, ...)) or dynamic([PI, ...])
fn dynamic(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let mut pending = vec![interp.deref(&args[0])];
    let mut tags = Vec::new();
    while let Some(spec) = pending.pop() {
        match spec.as_compound() {
            Some(c) if c.functor() == atoms().comma && c.arity() == 2 => {
                pending.push(interp.deref(&c.args()[1]));
                pending.push(interp.deref(&c.args()[0]));
            }
            Some(c) if c.functor() == atoms().dot && c.arity() == 2 => {
                let items = list_arg(interp, &spec)?;
                pending.extend(items.into_iter().rev());
            }
            _ if spec.is_nil() => {}
            _ => tags.push(indicator(interp, &spec)?),
        }
    }
    for tag in tags {
        check_modifiable(interp, tag)?;
        interp.engine().database().declare_dynamic(tag);
    }
    Ok(true)
}
