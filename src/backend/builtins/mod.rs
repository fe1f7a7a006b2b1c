//! Built-in predicate library.
//!
//! Every engine registers these in its [`PredicateRegistry`]:
//! - `control` - call/N, once, ignore, negation, forall, halt
//! - `exceptions` - catch/3, throw/1
//! - `unification` - =, \=, unify_with_occurs_check
//! - `typecheck` - var, nonvar, atom, number, ... ground
//! - `compare` - standard order comparison, compare/3
//! - `arith` - evaluation, is/2, numeric comparison, succ, plus, between
//! - `terms` - functor, arg, =.., copy_term, term_variables
//! - `lists` - member, memberchk, length, reverse, nth0/nth1, sorting, and
//!   the library clauses for append/3, last/2 and select/3
//! - `solutions` - findall, bagof, setof, aggregate_all
//! - `database` - assert family, retract, abolish, dynamic
//! - `flags` - current_prolog_flag/2, set_prolog_flag/2
//!
//! Deterministic built-ins are plain functions wrapped in
//! [`Deterministic`](crate::backend::predicate::Deterministic). The
//! nondeterministic ones implement [`Predicate`] directly and keep their
//! enumeration state in a choice record of their own type.

pub mod arith;
mod compare;
mod control;
mod database;
mod exceptions;
mod flags;
mod lists;
pub mod solutions;
mod terms;
mod typecheck;
mod unification;

#[cfg(test)]
mod tests;

use std::collections::VecDeque;

use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::list::{list_shape, ListShape};
use crate::backend::models::Term;
use crate::backend::predicate::{ExecResult, Predicate, PredicateResult};
use crate::backend::registry::PredicateRegistry;
use crate::backend::symbol::Atom;

pub use lists::library_clauses;

/// Install every built-in into `registry`
pub fn register_all(registry: &PredicateRegistry) {
    control::register(registry);
    exceptions::register(registry);
    unification::register(registry);
    typecheck::register(registry);
    compare::register(registry);
    arith::register(registry);
    terms::register(registry);
    lists::register(registry);
    solutions::register(registry);
    database::register(registry);
    flags::register(registry);
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

/// Dereferenced callable argument
pub(crate) fn callable_arg(interp: &Interpreter, term: &Term) -> EngineResult<Term> {
    match interp.deref(term) {
        Term::Var(_) => Err(EngineError::instantiation()),
        t if t.is_callable() => Ok(t),
        other => Err(EngineError::type_error("callable", other)),
    }
}

pub(crate) fn atom_arg(interp: &Interpreter, term: &Term) -> EngineResult<Atom> {
    match interp.deref(term) {
        Term::Var(_) => Err(EngineError::instantiation()),
        Term::Atom(a) => Ok(a),
        other => Err(EngineError::type_error("atom", other)),
    }
}

/// Machine integer argument; big integers are a representation error.
pub(crate) fn integer_arg(interp: &Interpreter, term: &Term) -> EngineResult<i64> {
    match interp.deref(term) {
        Term::Var(_) => Err(EngineError::instantiation()),
        Term::Integer(i) => Ok(i),
        Term::BigInteger(_) => Err(EngineError::representation_error("max_integer")),
        other => Err(EngineError::type_error("integer", other)),
    }
}

/// Elements of a proper list argument. A partial list is an instantiation
/// error, anything else a type error.
pub(crate) fn list_arg(interp: &Interpreter, term: &Term) -> EngineResult<Vec<Term>> {
    match list_shape(interp.store(), term) {
        ListShape::Proper(items) => Ok(items),
        ListShape::Partial(..) => Err(EngineError::instantiation()),
        ListShape::NotList => Err(EngineError::type_error("list", interp.resolve(term))),
    }
}

/// Reject an output argument that can never unify with a list.
pub(crate) fn check_list_output(interp: &Interpreter, term: &Term) -> EngineResult<()> {
    match list_shape(interp.store(), term) {
        ListShape::NotList => Err(EngineError::type_error("list", interp.resolve(term))),
        _ => Ok(()),
    }
}

/// Append `extra` arguments to a callable goal (`call/N`).
pub(crate) fn add_args(goal: Term, extra: &[Term]) -> EngineResult<Term> {
    if extra.is_empty() {
        return Ok(goal);
    }
    match goal {
        Term::Atom(name) => Ok(Term::app_atom(name, extra.to_vec())),
        Term::Compound(c) => {
            let mut args = c.args().to_vec();
            args.extend_from_slice(extra);
            Ok(Term::app_atom(c.functor(), args))
        }
        Term::Var(_) => Err(EngineError::instantiation()),
        other => Err(EngineError::type_error("callable", other)),
    }
}

// ---------------------------------------------------------------------------
// Precomputed alternatives
// ---------------------------------------------------------------------------

/// One solution: pairs of terms to unify
pub(crate) type Alternative = Vec<(Term, Term)>;

#[derive(Debug)]
struct AlternativesChoice {
    pending: VecDeque<Alternative>,
}

/// Try `pending` in order, leaving a record while more remain.
pub(crate) fn unify_alternatives(interp: &mut Interpreter, mut pending: VecDeque<Alternative>) -> ExecResult {
    while let Some(bindings) = pending.pop_front() {
        let mark = interp.mark();
        if bindings.iter().all(|(a, b)| interp.unify(a, b)) {
            if pending.is_empty() {
                return Ok(PredicateResult::SuccessLast);
            }
            interp.push_choice(mark, AlternativesChoice { pending });
            return Ok(PredicateResult::Success);
        }
        interp.undo_to(mark);
    }
    Ok(PredicateResult::Fail)
}

/// Signature of built-ins that compute all their solutions up front
pub(crate) type EnumerateFn = fn(&mut Interpreter, &[Term]) -> EngineResult<Vec<Alternative>>;

/// Nondeterministic built-in backed by an [`EnumerateFn`]
pub(crate) struct Enumerate {
    name: &'static str,
    func: EnumerateFn,
}

impl Enumerate {
    pub(crate) fn new(name: &'static str, func: EnumerateFn) -> Self {
        Enumerate { name, func }
    }
}

impl std::fmt::Debug for Enumerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Enumerate({})", self.name)
    }
}

impl Predicate for Enumerate {
    fn execute(&self, interp: &mut Interpreter, backtrack: bool, args: &[Term]) -> ExecResult {
        if backtrack {
            let choice = interp.pop_choice::<AlternativesChoice>()?;
            return unify_alternatives(interp, choice.pending);
        }
        let alternatives = (self.func)(interp, args)?;
        unify_alternatives(interp, alternatives.into())
    }
}

// ---------------------------------------------------------------------------
// Goal-running built-ins
// ---------------------------------------------------------------------------

/// Builds the goal a [`GoalCall`] runs from the call's arguments
pub(crate) type BuildGoalFn = fn(&Interpreter, &[Term]) -> EngineResult<Term>;

/// Built-in that runs a goal built from its arguments and passes its
/// solutions through; backtracking resumes that goal.
pub(crate) struct GoalCall {
    name: &'static str,
    build: BuildGoalFn,
}

impl GoalCall {
    pub(crate) fn new(name: &'static str, build: BuildGoalFn) -> Self {
        GoalCall { name, build }
    }
}

impl std::fmt::Debug for GoalCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GoalCall({})", self.name)
    }
}

impl Predicate for GoalCall {
    fn execute(&self, interp: &mut Interpreter, backtrack: bool, args: &[Term]) -> ExecResult {
        if backtrack {
            return interp.redo_goal();
        }
        let goal = (self.build)(interp, args)?;
        interp.call_goal(&goal)
    }
}
