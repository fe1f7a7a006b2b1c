//! Host predicates written against the public choice-point protocol,
//! mixed with compiled clauses and built-ins.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::*;
use prologtron::backend::{
    EngineError, ExecResult, Interpreter, Predicate, PredicateResult, Tag, Term,
};

/// countdown(+N, -X): X = N, N-1, ..., 1
#[derive(Debug)]
struct Countdown;

#[derive(Debug)]
struct CountdownChoice {
    out: Term,
    next: i64,
}

impl Predicate for Countdown {
    fn execute(&self, interp: &mut Interpreter, backtrack: bool, args: &[Term]) -> ExecResult {
        let (out, from) = if backtrack {
            let choice = interp.pop_choice::<CountdownChoice>()?;
            (choice.out, choice.next)
        } else {
            match interp.deref(&args[0]) {
                Term::Integer(n) => (args[1].clone(), n),
                Term::Var(_) => return Err(EngineError::instantiation()),
                other => return Err(EngineError::type_error("integer", other)),
            }
        };
        for n in (1..=from).rev() {
            let mark = interp.mark();
            if interp.unify(&out, &Term::integer(n)) {
                if n == 1 {
                    return Ok(PredicateResult::SuccessLast);
                }
                interp.push_choice(mark, CountdownChoice { out, next: n - 1 });
                return Ok(PredicateResult::Success);
            }
            interp.undo_to(mark);
        }
        Ok(PredicateResult::Fail)
    }
}

fn with_countdown(clauses: Vec<Term>) -> prologtron::Engine {
    let engine = program(clauses);
    engine.register(Tag::of("countdown", 2), Arc::new(Countdown));
    engine
}

#[test]
fn test_host_predicate_enumerates() {
    let engine = with_countdown(vec![]);
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let goal = app("countdown", vec![int(3), x.clone()]);
    assert_eq!(enumerate(&mut interp, &x, &goal, 10), vec![int(3), int(2), int(1)]);
}

#[test]
fn test_host_predicate_checks_arguments() {
    let engine = with_countdown(vec![]);
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let err = interp.solve(&app("countdown", vec![x.clone(), x])).unwrap_err();
    assert_eq!(err.kind_name(), Some("instantiation_error"));
    assert_eq!(interp.choice_height(), 0);
}

#[test]
fn test_interleaved_choice_points_keep_their_order() {
    // grid(X, Y) :- countdown(2, X), member(Y, [a, b]), countdown(1, _).
    let engine = with_countdown(vec![rule(
        app("grid", vec![v(0), v(1)]),
        vec![
            app("countdown", vec![int(2), v(0)]),
            app("member", vec![v(1), atoms(&["a", "b"])]),
            app("countdown", vec![int(1), v(2)]),
        ],
    )]);
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let y = interp.fresh_var().expect("var");
    let pair = app("-", vec![x.clone(), y.clone()]);
    let goal = app("grid", vec![x, y]);
    let expected = vec![
        app("-", vec![int(2), atom("a")]),
        app("-", vec![int(2), atom("b")]),
        app("-", vec![int(1), atom("a")]),
        app("-", vec![int(1), atom("b")]),
    ];
    assert_eq!(enumerate(&mut interp, &pair, &goal, 10), expected);
    assert_eq!(all(&mut interp, &pair, &goal), expected);
}

#[test]
fn test_host_predicate_under_cut_and_negation() {
    // top(X) :- countdown(5, X), X < 4, !.
    let engine = with_countdown(vec![rule(
        app("top", vec![v(0)]),
        vec![
            app("countdown", vec![int(5), v(0)]),
            app("<", vec![v(0), int(4)]),
            atom("!"),
        ],
    )]);
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    assert_eq!(enumerate(&mut interp, &x, &app("top", vec![x.clone()]), 10), vec![int(3)]);

    let never = app("\\+", vec![app("countdown", vec![int(3), int(7)])]);
    assert!(holds(&mut interp, &never));
}

#[test]
fn test_host_predicate_inside_all_solutions() {
    let engine = with_countdown(vec![]);
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let l = interp.fresh_var().expect("var");
    let goal = app("findall", vec![x.clone(), app("countdown", vec![int(4), x.clone()]), l.clone()]);
    assert_eq!(all(&mut interp, &l, &goal), vec![ints(&[4, 3, 2, 1])]);

    let goal = app(
        "aggregate_all",
        vec![app("sum", vec![x.clone()]), app("countdown", vec![int(4), x]), l.clone()],
    );
    assert_eq!(all(&mut interp, &l, &goal), vec![int(10)]);
}

#[test]
fn test_deterministic_host_function() {
    fn double(interp: &mut Interpreter, args: &[Term]) -> prologtron::EngineResult<bool> {
        match interp.deref(&args[0]) {
            Term::Integer(n) => Ok(interp.unify(&args[1], &Term::integer(n * 2))),
            _ => Ok(false),
        }
    }
    let engine = program(vec![]);
    engine.register_det("double", 2, double);
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    assert_eq!(all(&mut interp, &x, &app("double", vec![int(21), x.clone()])), vec![int(42)]);
    assert!(!holds(&mut interp, &app("double", vec![atom("a"), x])));
}

#[derive(Debug, Default)]
struct Hooked {
    installs: AtomicUsize,
    uninstalls: AtomicUsize,
}

#[derive(Debug)]
struct HookedPredicate(Arc<Hooked>);

impl Predicate for HookedPredicate {
    fn execute(&self, _interp: &mut Interpreter, _backtrack: bool, _args: &[Term]) -> ExecResult {
        Ok(PredicateResult::SuccessLast)
    }

    fn install(&self, _interp: &mut Interpreter) {
        self.0.installs.fetch_add(1, Ordering::SeqCst);
    }

    fn uninstall(&self, _interp: &mut Interpreter) {
        self.0.uninstalls.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_install_hooks_follow_redefinition() {
    let engine = program(vec![]);
    let first = Arc::new(Hooked::default());
    engine.register(Tag::of("hooked", 0), Arc::new(HookedPredicate(Arc::clone(&first))));

    let mut interp = engine.interpreter();
    assert!(holds(&mut interp, &atom("hooked")));
    assert!(holds(&mut interp, &atom("hooked")));
    assert_eq!(first.installs.load(Ordering::SeqCst), 1);
    assert_eq!(first.uninstalls.load(Ordering::SeqCst), 0);

    let second = Arc::new(Hooked::default());
    engine.register(Tag::of("hooked", 0), Arc::new(HookedPredicate(Arc::clone(&second))));
    assert!(holds(&mut interp, &atom("hooked")));
    assert_eq!(first.uninstalls.load(Ordering::SeqCst), 1);
    assert_eq!(second.installs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_registered_predicate_blocks_clauses() {
    let engine = with_countdown(vec![]);
    let err = engine
        .add_clause(app("countdown", vec![int(1), int(1)]))
        .unwrap_err();
    assert_eq!(err.kind_name(), Some("permission_error"));
}
