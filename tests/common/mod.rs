//! Shared helpers for integration tests
//!
//! Terms are built directly; there is no reader in this crate. Clause
//! variables are written `v(n)` and are local to the clause they appear in.

#![allow(dead_code)]

use prologtron::backend::models::list::list_from_vec;
use prologtron::backend::{Engine, Interpreter, PredicateResult, Term, VarId};

pub fn int(i: i64) -> Term {
    Term::integer(i)
}

pub fn atom(name: &str) -> Term {
    Term::atom(name)
}

pub fn app(name: &str, args: Vec<Term>) -> Term {
    Term::app(name, args)
}

pub fn v(n: u32) -> Term {
    Term::Var(VarId(n))
}

pub fn list(items: Vec<Term>) -> Term {
    list_from_vec(items)
}

pub fn ints(items: &[i64]) -> Term {
    list(items.iter().copied().map(int).collect())
}

pub fn atoms(names: &[&str]) -> Term {
    list(names.iter().map(|n| atom(n)).collect())
}

/// Right-nested conjunction
pub fn conj(mut goals: Vec<Term>) -> Term {
    let last = goals.pop().unwrap_or_else(|| atom("true"));
    goals
        .into_iter()
        .rev()
        .fold(last, |acc, goal| app(",", vec![goal, acc]))
}

pub fn rule(head: Term, body: Vec<Term>) -> Term {
    app(":-", vec![head, conj(body)])
}

/// An engine with `clauses` loaded in order
pub fn program(clauses: Vec<Term>) -> Engine {
    let engine = Engine::new();
    for clause in clauses {
        engine.add_clause(clause).expect("valid clause");
    }
    engine
}

/// Every answer of `goal`, as `template` resolved
pub fn all(interp: &mut Interpreter, template: &Term, goal: &Term) -> Vec<Term> {
    interp.find_all(template, goal).expect("goal should not raise")
}

/// Run `goal` once and report whether it succeeded, abandoning alternatives.
pub fn holds(interp: &mut Interpreter, goal: &Term) -> bool {
    let result = interp.solve(goal).expect("goal should not raise");
    interp.stop();
    result.succeeded()
}

/// Collect up to `limit` answers through `solve`/`next_solution`, checking
/// that each pending answer leaves exactly one choice record and the last
/// one leaves none.
pub fn enumerate(interp: &mut Interpreter, template: &Term, goal: &Term, limit: usize) -> Vec<Term> {
    let mut out = Vec::new();
    let mut result = interp.solve(goal).expect("goal should not raise");
    while result.succeeded() && out.len() < limit {
        out.push(interp.resolve(template));
        if result == PredicateResult::SuccessLast {
            assert_eq!(interp.choice_height(), 0, "last answer left a choice record");
            break;
        }
        assert_eq!(interp.choice_height(), 1, "answer left more than one record");
        result = interp.next_solution().expect("goal should not raise");
    }
    interp.stop();
    out
}
