//! Deep recursion and long failure-driven loops stay within their limits.

mod common;

use common::*;
use prologtron::backend::{EngineResult, PredicateResult};
use prologtron::{Engine, EngineConfig, Interpreter, Term};

fn counting_program(engine: Engine) -> Engine {
    // len([], 0).
    // len([_|T], N) :- len(T, M), N is M + 1.
    // f(0) :- !.
    // f(N) :- M is N - 1, findall(x, f(M), _).
    let clauses = vec![
        app("len", vec![Term::nil(), int(0)]),
        rule(
            app("len", vec![Term::cons(v(0), v(1)), v(2)]),
            vec![
                app("len", vec![v(1), v(3)]),
                app("is", vec![v(2), app("+", vec![v(3), int(1)])]),
            ],
        ),
        rule(app("f", vec![int(0)]), vec![atom("!")]),
        rule(
            app("f", vec![v(0)]),
            vec![
                app("is", vec![v(1), app("-", vec![v(0), int(1)])]),
                app("findall", vec![atom("x"), app("f", vec![v(1)]), v(2)]),
            ],
        ),
    ];
    for clause in clauses {
        engine.add_clause(clause).expect("valid clause");
    }
    engine
}

fn len_of(n: i64) -> Term {
    app("len", vec![ints(&(0..n).collect::<Vec<_>>()), int(n)])
}

/// Deep calls either answer or stop at the depth limit, never overflow.
fn succeeds_or_hits_depth(result: EngineResult<PredicateResult>) {
    match result {
        Ok(outcome) => assert!(outcome.succeeded()),
        Err(err) => assert_eq!(err.kind_name(), Some("resource_error")),
    }
}

#[test]
fn test_deep_non_tail_recursion_at_default_depth() {
    let engine = counting_program(Engine::new());
    let mut interp = engine.interpreter();
    assert!(holds(&mut interp, &len_of(900)));
    assert_eq!(interp.depth(), 0);

    succeeds_or_hits_depth(interp.solve(&len_of(999)));
    interp.stop();
    assert_eq!(interp.depth(), 0);
    assert_eq!(interp.choice_height(), 0);
}

#[test]
fn test_nested_findall_at_default_depth() {
    let engine = counting_program(Engine::new());
    let mut interp = engine.interpreter();
    assert!(holds(&mut interp, &app("f", vec![int(300)])));

    succeeds_or_hits_depth(interp.solve(&app("f", vec![int(999)])));
    interp.stop();
    assert_eq!(interp.depth(), 0);
}

#[test]
fn test_recursion_past_native_stack_with_raised_limit() {
    let engine = counting_program(Engine::with_config(EngineConfig {
        max_call_depth: 20_000,
        ..EngineConfig::default()
    }));
    let mut interp = engine.interpreter();
    assert!(holds(&mut interp, &len_of(5_000)));
    assert!(holds(&mut interp, &app("f", vec![int(2_000)])));
    assert_eq!(interp.depth(), 0);
}

fn churn_program() -> Engine {
    // q(X) :- Y = f(X), Y = f(_).
    // mk(X, g(X, Z)) :- Z = h(_).
    // thrower :- X = f(_), throw(X).
    program(vec![
        rule(
            app("q", vec![v(0)]),
            vec![
                app("=", vec![v(1), app("f", vec![v(0)])]),
                app("=", vec![v(1), app("f", vec![v(2)])]),
            ],
        ),
        rule(
            app("mk", vec![v(0), app("g", vec![v(0), v(1)])]),
            vec![app("=", vec![v(1), app("h", vec![v(2)])])],
        ),
        rule(
            atom("thrower"),
            vec![
                app("=", vec![v(0), app("f", vec![v(1)])]),
                app("throw", vec![v(0)]),
            ],
        ),
    ])
}

/// Store length once `between(1, N, X), q(X), X >= N` has its answer
fn cells_after_loop(interp: &mut Interpreter, n: i64) -> usize {
    let x = interp.fresh_var().expect("var");
    let goal = conj(vec![
        app("between", vec![int(1), int(n), x.clone()]),
        app("q", vec![x.clone()]),
        app(">=", vec![x.clone(), int(n)]),
    ]);
    assert!(interp.solve(&goal).expect("loop runs").succeeded());
    assert_eq!(interp.resolve(&x), int(n));
    let len = interp.store().len();
    interp.stop();
    len
}

#[test]
fn test_backtracking_releases_cells() {
    let engine = churn_program();
    let mut interp = engine.interpreter();
    let short = cells_after_loop(&mut interp, 10);
    interp.reset();
    let long = cells_after_loop(&mut interp, 100_000);
    assert_eq!(short, long);
}

#[test]
fn test_failure_driven_loop_stays_bounded() {
    let engine = churn_program();
    let mut interp = engine.interpreter();
    let before = interp.store().len();
    for n in [10, 10_000, 100_000] {
        let x = interp.fresh_var().expect("var");
        let body = conj(vec![
            app("between", vec![int(1), int(n), x.clone()]),
            app("q", vec![x]),
            atom("fail"),
        ]);
        assert!(holds(&mut interp, &app("\\+", vec![body])));
        assert!(interp.store().len() <= before + 1, "cells kept after {n} iterations");
        interp.reset();
    }
}

#[test]
fn test_findall_copies_survive_released_cells() {
    let engine = churn_program();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let t = interp.fresh_var().expect("var");
    let l = interp.fresh_var().expect("var");
    let goal = conj(vec![
        app(
            "findall",
            vec![
                t.clone(),
                conj(vec![app("member", vec![x.clone(), atoms(&["a", "b", "c"])]), app("mk", vec![x, t])]),
                l.clone(),
            ],
        ),
        app("length", vec![interp.fresh_var().expect("var"), int(4)]),
        app(
            "=",
            vec![
                l.clone(),
                list(vec![
                    app("g", vec![atom("a"), app("h", vec![int(1)])]),
                    app("g", vec![atom("b"), app("h", vec![int(2)])]),
                    app("g", vec![atom("c"), app("h", vec![int(3)])]),
                ]),
            ],
        ),
    ]);
    assert!(interp.solve(&goal).expect("no error").succeeded());
    assert_eq!(
        interp.resolve(&l),
        list(vec![
            app("g", vec![atom("a"), app("h", vec![int(1)])]),
            app("g", vec![atom("b"), app("h", vec![int(2)])]),
            app("g", vec![atom("c"), app("h", vec![int(3)])]),
        ])
    );
    interp.stop();
}

#[test]
fn test_caught_ball_keeps_its_variables() {
    let engine = churn_program();
    let mut interp = engine.interpreter();
    let ball = interp.fresh_var().expect("var");
    let inner = interp.fresh_var().expect("var");
    let cells = interp.fresh_var().expect("var");
    let goal = conj(vec![
        app("catch", vec![atom("thrower"), ball.clone(), atom("true")]),
        app("length", vec![cells.clone(), int(3)]),
        app("=", vec![cells, ints(&[1, 2, 3])]),
        app("=", vec![ball.clone(), app("f", vec![inner.clone()])]),
        app("var", vec![inner.clone()]),
    ]);
    assert!(interp.solve(&goal).expect("caught").succeeded());
    assert!(interp.deref(&inner).is_var());
    interp.stop();
}
