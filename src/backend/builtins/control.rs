//! Control built-ins.
//!
//! Conjunction, disjunction, if-then-else and negation are compiled inline in
//! clause bodies. The entries here serve goals reached only at run time, such
//! as `call(',', A, B)`, and they make the control constructs static
//! procedures. Cut inside a goal run by one of them is local to that goal.

use std::sync::Arc;

use super::{add_args, callable_arg, integer_arg, GoalCall};
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::{Tag, Term};
use crate::backend::registry::PredicateRegistry;
use crate::backend::symbol::atoms;

pub(super) fn register(registry: &PredicateRegistry) {
    registry.register_det("true", 0, |_, _| Ok(true));
    registry.register_det("fail", 0, |_, _| Ok(false));
    registry.register_det("false", 0, |_, _| Ok(false));
    registry.register_det("!", 0, |_, _| Ok(true));

    for arity in 1..=8u32 {
        registry.register(Tag::of("call", arity), Arc::new(GoalCall::new("call", build_call)));
    }
    registry.register(Tag::of(",", 2), Arc::new(GoalCall::new(",", |_, args| {
        Ok(Term::app_atom(atoms().comma, args.to_vec()))
    })));
    registry.register(Tag::of(";", 2), Arc::new(GoalCall::new(";", |_, args| {
        Ok(Term::app_atom(atoms().semicolon, args.to_vec()))
    })));
    registry.register(Tag::of("->", 2), Arc::new(GoalCall::new("->", |_, args| {
        Ok(Term::app_atom(atoms().arrow, args.to_vec()))
    })));
    registry.register(Tag::of("^", 2), Arc::new(GoalCall::new("^", build_existential)));

    registry.register_det("\\+", 1, not_provable);
    registry.register_det("not", 1, not_provable);
    registry.register_det("once", 1, once);
    registry.register_det("ignore", 1, ignore);
    registry.register_det("forall", 2, forall);
    registry.register_det("halt", 0, |_, _| Err(EngineError::Halt(0)));
    registry.register_det("halt", 1, halt);
}

/// `call(G, A1, ..., An)`: `G` with the extra arguments appended
fn build_call(interp: &Interpreter, args: &[Term]) -> EngineResult<Term> {
    let goal = callable_arg(interp, &args[0])?;
    add_args(goal, &args[1..])
}

/// `V^Goal` outside bagof/setof just calls `Goal`
fn build_existential(interp: &Interpreter, args: &[Term]) -> EngineResult<Term> {
    callable_arg(interp, &args[1])
}

/// Run `goal` once: keep the first solution's bindings, drop its alternatives.
pub(super) fn solve_once(interp: &mut Interpreter, goal: &Term) -> EngineResult<bool> {
    let height = interp.choice_height();
    let result = interp.call_goal(goal)?;
    interp.choices.cut_to(height);
    Ok(result.succeeded())
}

/// Does `goal` have a solution? Leaves no bindings either way.
pub(super) fn provable(interp: &mut Interpreter, goal: &Term) -> EngineResult<bool> {
    let checkpoint = interp.checkpoint();
    let result = interp.call_goal(goal);
    interp.rollback(checkpoint);
    Ok(result?.succeeded())
}

fn not_provable(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let goal = callable_arg(interp, &args[0])?;
    Ok(!provable(interp, &goal)?)
}

fn once(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let goal = callable_arg(interp, &args[0])?;
    solve_once(interp, &goal)
}

fn ignore(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let goal = callable_arg(interp, &args[0])?;
    solve_once(interp, &goal)?;
    Ok(true)
}

/// `forall(Cond, Action)` is `\+ (Cond, \+ Action)`
fn forall(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let cond = callable_arg(interp, &args[0])?;
    let action = callable_arg(interp, &args[1])?;
    let a = atoms();
    let counterexample = Term::app_atom(
        a.comma,
        vec![cond, Term::app_atom(a.not_provable, vec![action])],
    );
    Ok(!provable(interp, &counterexample)?)
}

fn halt(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let code = integer_arg(interp, &args[0])?;
    let code = i32::try_from(code)
        .map_err(|_| EngineError::domain_error("exit_code", Term::Integer(code)))?;
    Err(EngineError::Halt(code))
}
