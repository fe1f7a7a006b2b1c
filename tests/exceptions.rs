//! Exceptions crossing clause boundaries and choice points.

mod common;

use common::*;
use prologtron::backend::{EngineError, PredicateResult};
use prologtron::{Engine, EngineConfig, UnknownPolicy};

fn searcher() -> Engine {
    // p(1). p(2). p(3).
    // check(X) :- p(X), X >= 2, throw(found(X)).
    program(vec![
        app("p", vec![int(1)]),
        app("p", vec![int(2)]),
        app("p", vec![int(3)]),
        rule(
            app("check", vec![v(0)]),
            vec![
                app("p", vec![v(0)]),
                app(">=", vec![v(0), int(2)]),
                app("throw", vec![app("found", vec![v(0)])]),
            ],
        ),
    ])
}

#[test]
fn test_throw_unwinds_pending_alternatives() {
    let engine = searcher();
    let mut interp = engine.interpreter();
    let y = interp.fresh_var().expect("var");
    let z = interp.fresh_var().expect("var");
    let goal = app(
        "catch",
        vec![app("check", vec![y.clone()]), app("found", vec![z.clone()]), atom("true")],
    );
    assert_eq!(interp.solve(&goal).expect("caught"), PredicateResult::SuccessLast);
    assert_eq!(interp.resolve(&z), int(2));
    // Bindings made inside the catch goal are undone before the recovery runs.
    assert!(interp.deref(&y).is_var());
    assert_eq!(interp.choice_height(), 0);
    interp.stop();
}

#[test]
fn test_uncaught_ball_reaches_host_resolved() {
    let engine = searcher();
    let mut interp = engine.interpreter();
    let y = interp.fresh_var().expect("var");
    let mark = interp.mark();
    match interp.solve(&app("check", vec![y])) {
        Err(EngineError::Thrown(ball)) => assert_eq!(ball, app("found", vec![int(2)])),
        other => panic!("expected a thrown ball, got {other:?}"),
    }
    assert_eq!(interp.mark(), mark);
    assert_eq!(interp.choice_height(), 0);
    assert_eq!(interp.depth(), 0);
}

#[test]
fn test_engine_errors_carry_iso_context() {
    // bad(X) :- X is foo + 1.
    let engine = program(vec![rule(
        app("bad", vec![v(0)]),
        vec![app("is", vec![v(0), app("+", vec![atom("foo"), int(1)])])],
    )]);
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let t = interp.fresh_var().expect("var");
    let c = interp.fresh_var().expect("var");
    let goal = app(
        "catch",
        vec![
            app("bad", vec![x]),
            app("error", vec![app("type_error", vec![t.clone(), c.clone()]), interp.fresh_var().expect("var")]),
            atom("true"),
        ],
    );
    assert!(interp.solve(&goal).expect("caught").succeeded());
    assert_eq!(interp.resolve(&t), atom("evaluable"));
    assert_eq!(interp.resolve(&c), app("/", vec![atom("foo"), int(0)]));
    interp.stop();
}

#[test]
fn test_recovery_goal_may_fail_or_rethrow() {
    let engine = searcher();
    let mut interp = engine.interpreter();
    let y = interp.fresh_var().expect("var");
    let e = interp.fresh_var().expect("var");

    let failing = app("catch", vec![app("check", vec![y.clone()]), e.clone(), atom("fail")]);
    assert_eq!(interp.solve(&failing).expect("no error"), PredicateResult::Fail);

    let rethrow = app(
        "catch",
        vec![
            app("check", vec![y]),
            e.clone(),
            app("throw", vec![app("wrapped", vec![e])]),
        ],
    );
    match interp.solve(&rethrow) {
        Err(EngineError::Thrown(ball)) => {
            assert_eq!(ball, app("wrapped", vec![app("found", vec![int(2)])]))
        }
        other => panic!("expected a thrown ball, got {other:?}"),
    }
}

#[test]
fn test_depth_limit_is_catchable() {
    // deep(N) :- N > 0, M is N - 1, deep(M), true.
    let engine = program(vec![
        app("deep", vec![int(0)]),
        rule(
            app("deep", vec![v(0)]),
            vec![
                app(">", vec![v(0), int(0)]),
                app("is", vec![v(1), app("-", vec![v(0), int(1)])]),
                app("deep", vec![v(1)]),
                atom("true"),
            ],
        ),
    ]);
    let mut interp = engine.interpreter();
    let what = interp.fresh_var().expect("var");
    let goal = app(
        "catch",
        vec![
            app("deep", vec![int(5000)]),
            app("error", vec![app("resource_error", vec![what.clone()]), interp.fresh_var().expect("var")]),
            atom("true"),
        ],
    );
    assert!(interp.solve(&goal).expect("caught").succeeded());
    assert_eq!(interp.resolve(&what), atom("call_depth"));
    interp.stop();
    assert_eq!(interp.depth(), 0);
    assert!(holds(&mut interp, &app("deep", vec![int(50)])));
}

#[test]
fn test_halt_skips_every_handler() {
    // guarded :- catch(halt(2), _, true).
    let engine = program(vec![rule(
        atom("guarded"),
        vec![app("catch", vec![app("halt", vec![int(2)]), v(0), atom("true")])],
    )]);
    let mut interp = engine.interpreter();
    let outer = interp.fresh_var().expect("var");
    let goal = app("catch", vec![atom("guarded"), outer, atom("true")]);
    assert!(matches!(interp.solve(&goal), Err(EngineError::Halt(2))));
    assert_eq!(interp.choice_height(), 0);
}

#[test]
fn test_unknown_procedure_policy() {
    let engine = program(vec![]);
    let mut interp = engine.interpreter();
    let err = interp.solve(&app("nowhere", vec![int(1)])).unwrap_err();
    assert_eq!(err.kind_name(), Some("existence_error"));
    assert_eq!(
        err.formal().cloned(),
        Some(app(
            "existence_error",
            vec![atom("procedure"), app("/", vec![atom("nowhere"), int(1)])]
        ))
    );

    let lenient = Engine::with_config(EngineConfig {
        unknown: UnknownPolicy::Fail,
        ..EngineConfig::default()
    });
    let mut interp = lenient.interpreter();
    assert!(!holds(&mut interp, &app("nowhere", vec![int(1)])));
}
