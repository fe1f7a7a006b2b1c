use super::*;
use crate::backend::engine::Engine;
use crate::backend::models::list::{list_from_vec, list_shape, ListShape};
use crate::backend::models::{Tag, VarId};
use crate::config::EngineConfig;

fn int(i: i64) -> Term {
    Term::integer(i)
}

fn atom(name: &str) -> Term {
    Term::atom(name)
}

fn app(name: &str, args: Vec<Term>) -> Term {
    Term::app(name, args)
}

fn list(items: Vec<Term>) -> Term {
    list_from_vec(items)
}

fn ints(items: &[i64]) -> Term {
    list(items.iter().copied().map(int).collect())
}

/// Clause-local variable
fn v(n: u32) -> Term {
    Term::Var(VarId(n))
}

fn engine_with(clauses: Vec<Term>) -> Engine {
    let engine = Engine::new();
    for clause in clauses {
        engine.add_clause(clause).expect("valid clause");
    }
    engine
}

/// Solve `goal` once (then stop), returning `template` as resolved by it.
fn once_resolved(interp: &mut Interpreter, template: &Term, goal: &Term) -> Option<Term> {
    let result = interp.solve(goal).expect("no error");
    let answer = result.succeeded().then(|| interp.resolve(template));
    interp.stop();
    answer
}

fn succeeds(interp: &mut Interpreter, goal: &Term) -> bool {
    let ok = interp.solve(goal).expect("no error").succeeded();
    interp.stop();
    ok
}

fn error_kind(interp: &mut Interpreter, goal: &Term) -> Option<&'static str> {
    interp.solve(goal).unwrap_err().kind_name()
}

// ---------------------------------------------------------------------------
// Control and exceptions
// ---------------------------------------------------------------------------

#[test]
fn test_call_n_appends_arguments() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let goal = app("call", vec![app("=", vec![x.clone()]), int(5)]);
    assert_eq!(once_resolved(&mut interp, &x, &goal), Some(int(5)));
}

#[test]
fn test_once_ignore_negation_forall() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let member = app("member", vec![x.clone(), ints(&[1, 2, 3])]);

    assert_eq!(
        interp.solve(&app("once", vec![member.clone()])).expect("ok"),
        PredicateResult::SuccessLast
    );
    assert_eq!(interp.resolve(&x), int(1));
    interp.stop();

    assert!(succeeds(&mut interp, &app("ignore", vec![atom("fail")])));
    assert!(succeeds(&mut interp, &app("\\+", vec![app("=", vec![int(1), int(2)])])));
    assert!(!succeeds(&mut interp, &app("\\+", vec![member.clone()])));
    assert!(interp.deref(&x).is_var());

    let positive = app("forall", vec![member.clone(), app(">", vec![x.clone(), int(0)])]);
    assert!(succeeds(&mut interp, &positive));
    let small = app("forall", vec![member, app("<", vec![x.clone(), int(3)])]);
    assert!(!succeeds(&mut interp, &small));
}

#[test]
fn test_halt_is_not_catchable() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let goal = app("catch", vec![app("halt", vec![int(3)]), interp.fresh_var().expect("var"), atom("true")]);
    assert!(matches!(interp.solve(&goal), Err(EngineError::Halt(3))));
    assert_eq!(interp.choice_height(), 0);
}

#[test]
fn test_catch_binds_ball() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let goal = app(
        "catch",
        vec![app("throw", vec![app("oops", vec![int(1)])]), x.clone(), atom("true")],
    );
    assert_eq!(once_resolved(&mut interp, &x, &goal), Some(app("oops", vec![int(1)])));
}

#[test]
fn test_catch_rethrows_unmatched_ball() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let goal = app(
        "catch",
        vec![app("throw", vec![atom("inner")]), atom("other"), atom("true")],
    );
    let err = interp.solve(&goal).unwrap_err();
    assert_eq!(err.ball(), Some(&atom("inner")));
    assert_eq!(interp.choice_height(), 0);
}

#[test]
fn test_catch_is_transparent_to_backtracking() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let goal = app(
        "catch",
        vec![app("member", vec![x.clone(), ints(&[1, 2, 3])]), interp.fresh_var().expect("var"), atom("true")],
    );
    assert_eq!(interp.find_all(&x, &goal).expect("ok"), vec![int(1), int(2), int(3)]);
}

#[test]
fn test_catch_intercepts_error_raised_on_redo() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let y = interp.fresh_var().expect("var");
    // catch((member(X, [1,2]), X > 1, throw(found(X))), found(Y), true)
    let protected = app(
        ",",
        vec![
            app("member", vec![x.clone(), ints(&[1, 2])]),
            app(
                ",",
                vec![
                    app(">", vec![x.clone(), int(1)]),
                    app("throw", vec![app("found", vec![x.clone()])]),
                ],
            ),
        ],
    );
    let goal = app("catch", vec![protected, app("found", vec![y.clone()]), atom("true")]);
    assert_eq!(interp.solve(&goal).expect("ok"), PredicateResult::SuccessLast);
    assert_eq!(interp.resolve(&y), int(2));
    assert!(interp.deref(&x).is_var());
}

#[test]
fn test_instantiation_error_is_catchable_as_iso_term() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let e = interp.fresh_var().expect("var");
    let goal = app(
        "catch",
        vec![app("is", vec![interp.fresh_var().expect("var"), interp.fresh_var().expect("var")]), e.clone(), atom("true")],
    );
    let ball = once_resolved(&mut interp, &e, &goal).expect("caught");
    assert_eq!(ball.args()[0], atom("instantiation_error"));
}

// ---------------------------------------------------------------------------
// Unification, type checks, comparison
// ---------------------------------------------------------------------------

#[test]
fn test_occurs_check_variants() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let cyclic = app("f", vec![x.clone()]);
    assert!(!succeeds(&mut interp, &app("unify_with_occurs_check", vec![x.clone(), cyclic.clone()])));
    assert!(succeeds(&mut interp, &app("=", vec![x.clone(), cyclic.clone()])));

    let flag = app("set_prolog_flag", vec![atom("occurs_check"), atom("true")]);
    assert!(succeeds(&mut interp, &flag));
    assert!(!succeeds(&mut interp, &app("=", vec![x, cyclic])));
}

#[test]
fn test_not_unifiable_leaves_no_bindings() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let goal = app("\\=", vec![app("f", vec![x.clone(), int(1)]), app("f", vec![int(2), int(3)])]);
    assert!(succeeds(&mut interp, &goal));
    assert!(interp.deref(&x).is_var());
}

#[test]
fn test_type_checks() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    assert!(succeeds(&mut interp, &app("var", vec![x.clone()])));
    assert!(succeeds(&mut interp, &app("atom", vec![atom("a")])));
    assert!(!succeeds(&mut interp, &app("atom", vec![int(1)])));
    assert!(succeeds(&mut interp, &app("integer", vec![int(1)])));
    assert!(succeeds(&mut interp, &app("float", vec![Term::float(1.5)])));
    assert!(succeeds(&mut interp, &app("atomic", vec![Term::float(1.5)])));
    assert!(succeeds(&mut interp, &app("compound", vec![app("f", vec![x.clone()])])));
    assert!(succeeds(&mut interp, &app("callable", vec![atom("a")])));
    assert!(succeeds(&mut interp, &app("is_list", vec![ints(&[1, 2])])));
    assert!(!succeeds(&mut interp, &app("is_list", vec![Term::cons(int(1), x.clone())])));
    assert!(!succeeds(&mut interp, &app("ground", vec![app("f", vec![x])])));
}

#[test]
fn test_standard_order_comparison() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let o = interp.fresh_var().expect("var");
    assert!(succeeds(&mut interp, &app("@<", vec![int(1), atom("a")])));
    assert!(succeeds(&mut interp, &app("@<", vec![atom("a"), app("f", vec![atom("a")])])));
    assert!(succeeds(&mut interp, &app("@<", vec![app("g", vec![int(9)]), app("f", vec![int(1), int(2)])])));
    assert!(succeeds(&mut interp, &app("\\==", vec![int(1), Term::float(1.0)])));
    let goal = app("compare", vec![o.clone(), int(2), int(1)]);
    assert_eq!(once_resolved(&mut interp, &o, &goal), Some(atom(">")));
    let bad = app("compare", vec![atom("less"), int(1), int(2)]);
    assert_eq!(error_kind(&mut interp, &bad), Some("domain_error"));
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

#[test]
fn test_is_and_comparison() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let goal = app("is", vec![x.clone(), app("+", vec![int(1), app("*", vec![int(2), int(3)])])]);
    assert_eq!(once_resolved(&mut interp, &x, &goal), Some(int(7)));
    assert!(succeeds(&mut interp, &app("=:=", vec![int(1), Term::float(1.0)])));
    assert!(succeeds(&mut interp, &app("<", vec![int(1), Term::float(1.5)])));
    assert!(!succeeds(&mut interp, &app(">=", vec![int(1), int(2)])));
    let bad = app("<", vec![atom("a"), int(1)]);
    assert_eq!(error_kind(&mut interp, &bad), Some("type_error"));
}

#[test]
fn test_succ_and_plus() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    assert_eq!(once_resolved(&mut interp, &x, &app("succ", vec![x.clone(), int(4)])), Some(int(3)));
    assert_eq!(once_resolved(&mut interp, &x, &app("succ", vec![int(4), x.clone()])), Some(int(5)));
    assert!(!succeeds(&mut interp, &app("succ", vec![x.clone(), int(0)])));
    assert_eq!(error_kind(&mut interp, &app("succ", vec![int(-1), x.clone()])), Some("type_error"));
    assert_eq!(
        once_resolved(&mut interp, &x, &app("plus", vec![int(2), x.clone(), int(5)])),
        Some(int(3))
    );
}

#[test]
fn test_between_enumerates_and_checks() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let goal = app("between", vec![int(1), int(3), x.clone()]);
    assert_eq!(interp.find_all(&x, &goal).expect("ok"), vec![int(1), int(2), int(3)]);
    assert!(succeeds(&mut interp, &app("between", vec![int(1), int(3), int(2)])));
    assert!(!succeeds(&mut interp, &app("between", vec![int(3), int(1), x.clone()])));

    let unbounded = app("between", vec![int(1), atom("inf"), x.clone()]);
    assert_eq!(interp.solve(&unbounded).expect("ok"), PredicateResult::Success);
    assert_eq!(interp.next_solution().expect("ok"), PredicateResult::Success);
    assert_eq!(interp.resolve(&x), int(2));
    interp.stop();
    assert_eq!(interp.choice_height(), 0);
}

// ---------------------------------------------------------------------------
// Term inspection
// ---------------------------------------------------------------------------

#[test]
fn test_functor_both_directions() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let n = interp.fresh_var().expect("var");
    let a = interp.fresh_var().expect("var");
    let pair = app("p", vec![n.clone(), a.clone()]);
    let goal = app("functor", vec![app("foo", vec![int(1), int(2)]), n.clone(), a.clone()]);
    assert_eq!(once_resolved(&mut interp, &pair, &goal), Some(app("p", vec![atom("foo"), int(2)])));

    let t = interp.fresh_var().expect("var");
    let goal = app("functor", vec![t.clone(), atom("bar"), int(3)]);
    let built = once_resolved(&mut interp, &t, &goal).expect("built");
    assert_eq!(built.callable_tag(), Some(Tag::of("bar", 3)));

    let goal = app("functor", vec![t.clone(), int(7), int(0)]);
    assert_eq!(once_resolved(&mut interp, &t, &goal), Some(int(7)));
    let goal = app("functor", vec![t, atom("bar"), int(-1)]);
    assert_eq!(error_kind(&mut interp, &goal), Some("domain_error"));
}

#[test]
fn test_arg_enumerates_positions() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let n = interp.fresh_var().expect("var");
    let a = interp.fresh_var().expect("var");
    let goal = app("arg", vec![n.clone(), app("f", vec![atom("x"), atom("y")]), a.clone()]);
    let pair = app("-", vec![n, a.clone()]);
    assert_eq!(
        interp.find_all(&pair, &goal).expect("ok"),
        vec![
            app("-", vec![int(1), atom("x")]),
            app("-", vec![int(2), atom("y")]),
        ]
    );
    let goal = app("arg", vec![int(3), app("f", vec![atom("x")]), a]);
    assert!(!succeeds(&mut interp, &goal));
}

#[test]
fn test_univ_and_copy_term() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let l = interp.fresh_var().expect("var");
    let goal = app("=..", vec![app("f", vec![int(1), int(2)]), l.clone()]);
    assert_eq!(
        once_resolved(&mut interp, &l, &goal),
        Some(list(vec![atom("f"), int(1), int(2)]))
    );
    let t = interp.fresh_var().expect("var");
    let goal = app("=..", vec![t.clone(), list(vec![atom("g"), atom("a")])]);
    assert_eq!(once_resolved(&mut interp, &t, &goal), Some(app("g", vec![atom("a")])));
    let goal = app("=..", vec![t.clone(), Term::nil()]);
    assert_eq!(error_kind(&mut interp, &goal), Some("domain_error"));

    let x = interp.fresh_var().expect("var");
    let c = interp.fresh_var().expect("var");
    let goal = app("copy_term", vec![app("f", vec![x.clone(), x.clone()]), c.clone()]);
    let copy = once_resolved(&mut interp, &c, &goal).expect("copied");
    let args = copy.args();
    assert!(args[0].is_var());
    assert_eq!(args[0], args[1]);
    assert_ne!(args[0], x);
}

#[test]
fn test_term_variables_in_order() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let y = interp.fresh_var().expect("var");
    let vs = interp.fresh_var().expect("var");
    let goal = app(
        "term_variables",
        vec![app("f", vec![y.clone(), app("g", vec![x.clone(), y.clone()])]), vs.clone()],
    );
    assert_eq!(once_resolved(&mut interp, &vs, &goal), Some(list(vec![y, x])));
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

#[test]
fn test_member_last_element_is_deterministic() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let goal = app("member", vec![atom("c"), list(vec![atom("a"), atom("b"), atom("c")])]);
    assert_eq!(interp.solve(&goal).expect("ok"), PredicateResult::SuccessLast);
    assert_eq!(interp.choice_height(), 0);
}

#[test]
fn test_member_extends_open_list() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let l = interp.fresh_var().expect("var");
    let goal = app("member", vec![atom("a"), l.clone()]);
    let mut lengths = Vec::new();
    let mut result = interp.solve(&goal).expect("ok");
    for _ in 0..3 {
        assert_eq!(result, PredicateResult::Success);
        match list_shape(interp.store(), &l) {
            ListShape::Partial(items, _) => {
                assert_eq!(items.last(), Some(&atom("a")));
                lengths.push(items.len());
            }
            other => panic!("expected a partial list, got {:?}", other),
        }
        result = interp.next_solution().expect("ok");
    }
    interp.stop();
    assert_eq!(lengths, vec![1, 2, 3]);
}

#[test]
fn test_memberchk_commits_to_first_match() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    let items = list(vec![app("k", vec![int(1), atom("a")]), app("k", vec![int(1), atom("b")])]);
    let goal = app("memberchk", vec![app("k", vec![int(1), x.clone()]), items]);
    assert_eq!(interp.solve(&goal).expect("ok"), PredicateResult::SuccessLast);
    assert_eq!(interp.resolve(&x), atom("a"));
}

#[test]
fn test_length_modes() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let n = interp.fresh_var().expect("var");
    assert_eq!(once_resolved(&mut interp, &n, &app("length", vec![ints(&[1, 2, 3]), n.clone()])), Some(int(3)));

    let t = interp.fresh_var().expect("var");
    let partial = Term::cons(atom("a"), t.clone());
    let goal = app("length", vec![partial.clone(), int(3)]);
    let resolved = once_resolved(&mut interp, &partial, &goal).expect("ok");
    assert!(matches!(list_shape(interp.store(), &resolved), ListShape::Proper(items) if items.len() == 3));

    let l = interp.fresh_var().expect("var");
    let goal = app("length", vec![l.clone(), n.clone()]);
    assert_eq!(interp.solve(&goal).expect("ok"), PredicateResult::Success);
    assert_eq!(interp.resolve(&n), int(0));
    interp.next_solution().expect("ok");
    interp.next_solution().expect("ok");
    assert_eq!(interp.resolve(&n), int(2));
    interp.stop();

    assert_eq!(error_kind(&mut interp, &app("length", vec![l, int(-1)])), Some("domain_error"));
}

#[test]
fn test_append_library_splits() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let a = interp.fresh_var().expect("var");
    let b = interp.fresh_var().expect("var");
    let goal = app("append", vec![a.clone(), b.clone(), ints(&[1, 2])]);
    let split = app("-", vec![a, b]);
    assert_eq!(
        interp.find_all(&split, &goal).expect("ok"),
        vec![
            app("-", vec![ints(&[]), ints(&[1, 2])]),
            app("-", vec![ints(&[1]), ints(&[2])]),
            app("-", vec![ints(&[1, 2]), ints(&[])]),
        ]
    );
    let r = interp.fresh_var().expect("var");
    let goal = app("append", vec![ints(&[1]), ints(&[2, 3]), r.clone()]);
    assert_eq!(interp.solve(&goal).expect("ok"), PredicateResult::SuccessLast);
    assert_eq!(interp.resolve(&r), ints(&[1, 2, 3]));
}

#[test]
fn test_last_select_reverse_nth() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let x = interp.fresh_var().expect("var");
    assert_eq!(once_resolved(&mut interp, &x, &app("last", vec![ints(&[1, 2, 3]), x.clone()])), Some(int(3)));
    assert_eq!(once_resolved(&mut interp, &x, &app("reverse", vec![ints(&[1, 2, 3]), x.clone()])), Some(ints(&[3, 2, 1])));
    assert_eq!(once_resolved(&mut interp, &x, &app("nth0", vec![int(1), ints(&[7, 8, 9]), x.clone()])), Some(int(8)));
    assert_eq!(once_resolved(&mut interp, &x, &app("nth1", vec![int(1), ints(&[7, 8, 9]), x.clone()])), Some(int(7)));

    let rest = interp.fresh_var().expect("var");
    let goal = app("select", vec![x.clone(), ints(&[1, 2, 3]), rest.clone()]);
    let pair = app("-", vec![x.clone(), rest]);
    assert_eq!(
        interp.find_all(&pair, &goal).expect("ok"),
        vec![
            app("-", vec![int(1), ints(&[2, 3])]),
            app("-", vec![int(2), ints(&[1, 3])]),
            app("-", vec![int(3), ints(&[1, 2])]),
        ]
    );

    let i = interp.fresh_var().expect("var");
    let goal = app("nth1", vec![i.clone(), list(vec![atom("a"), atom("b")]), x.clone()]);
    assert_eq!(interp.find_all(&i, &goal).expect("ok"), vec![int(1), int(2)]);
}

#[test]
fn test_sorting() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let s = interp.fresh_var().expect("var");
    let input = ints(&[3, 1, 2, 1]);
    assert_eq!(once_resolved(&mut interp, &s, &app("sort", vec![input.clone(), s.clone()])), Some(ints(&[1, 2, 3])));
    assert_eq!(once_resolved(&mut interp, &s, &app("msort", vec![input.clone(), s.clone()])), Some(ints(&[1, 1, 2, 3])));
    assert_eq!(
        once_resolved(&mut interp, &s, &app("sort", vec![int(0), atom("@>="), input, s.clone()])),
        Some(ints(&[3, 2, 1, 1]))
    );

    let pairs = list(vec![
        app("-", vec![int(2), atom("a")]),
        app("-", vec![int(1), atom("b")]),
        app("-", vec![int(2), atom("c")]),
    ]);
    assert_eq!(
        once_resolved(&mut interp, &s, &app("keysort", vec![pairs.clone(), s.clone()])),
        Some(list(vec![
            app("-", vec![int(1), atom("b")]),
            app("-", vec![int(2), atom("a")]),
            app("-", vec![int(2), atom("c")]),
        ]))
    );
    assert_eq!(
        once_resolved(&mut interp, &s, &app("sort", vec![int(1), atom("@<"), pairs, s.clone()])),
        Some(list(vec![app("-", vec![int(1), atom("b")]), app("-", vec![int(2), atom("a")])]))
    );
    let bad = app("keysort", vec![list(vec![atom("x")]), s]);
    assert_eq!(error_kind(&mut interp, &bad), Some("type_error"));
}

// ---------------------------------------------------------------------------
// All-solutions
// ---------------------------------------------------------------------------

fn witness_engine() -> Engine {
    engine_with(vec![
        app("p", vec![app("w", vec![atom("a")]), int(1)]),
        app("p", vec![app("w", vec![atom("b")]), int(2)]),
        app("p", vec![app("w", vec![atom("a")]), int(3)]),
        app("p", vec![app("w", vec![atom("a")]), int(1)]),
    ])
}

#[test]
fn test_collect_all_restores_trail() {
    let engine = witness_engine();
    let mut interp = engine.interpreter();
    let w = interp.fresh_var().expect("var");
    let v = interp.fresh_var().expect("var");
    let mark = interp.mark();
    let found = solutions::collect_all(&mut interp, &v, &app("p", vec![w.clone(), v.clone()])).expect("ok");
    assert_eq!(found, vec![int(1), int(2), int(3), int(1)]);
    assert_eq!(interp.mark(), mark);
    assert!(interp.deref(&w).is_var());
    assert_eq!(interp.choice_height(), 0);
}

#[test]
fn test_findall_variants() {
    let engine = witness_engine();
    let mut interp = engine.interpreter();
    let v = interp.fresh_var().expect("var");
    let l = interp.fresh_var().expect("var");
    let goal = app("findall", vec![v.clone(), app("p", vec![app("w", vec![atom("a")]), v.clone()]), l.clone()]);
    assert_eq!(once_resolved(&mut interp, &l, &goal), Some(ints(&[1, 3, 1])));

    let goal = app("findall", vec![v.clone(), atom("fail"), l.clone()]);
    assert_eq!(once_resolved(&mut interp, &l, &goal), Some(Term::nil()));

    let goal = app("findall", vec![v.clone(), app("p", vec![app("w", vec![atom("b")]), v.clone()]), l.clone(), ints(&[9])]);
    assert_eq!(once_resolved(&mut interp, &l, &goal), Some(ints(&[2, 9])));

    let goal = app("findall", vec![v, atom("true"), atom("not_a_list")]);
    assert_eq!(error_kind(&mut interp, &goal), Some("type_error"));
}

#[test]
fn test_bagof_groups_by_witness_in_first_appearance_order() {
    let engine = witness_engine();
    let mut interp = engine.interpreter();
    let w = interp.fresh_var().expect("var");
    let v = interp.fresh_var().expect("var");
    let l = interp.fresh_var().expect("var");
    let goal = app("bagof", vec![v.clone(), app("p", vec![w.clone(), v.clone()]), l.clone()]);
    let answer = app("-", vec![w.clone(), l.clone()]);
    assert_eq!(
        interp.find_all(&answer, &goal).expect("ok"),
        vec![
            app("-", vec![app("w", vec![atom("a")]), ints(&[1, 3, 1])]),
            app("-", vec![app("w", vec![atom("b")]), ints(&[2])]),
        ]
    );

    let goal = app("setof", vec![v.clone(), app("p", vec![w.clone(), v.clone()]), l.clone()]);
    assert_eq!(
        interp.find_all(&answer, &goal).expect("ok"),
        vec![
            app("-", vec![app("w", vec![atom("a")]), ints(&[1, 3])]),
            app("-", vec![app("w", vec![atom("b")]), ints(&[2])]),
        ]
    );
}

#[test]
fn test_bagof_existential_and_empty() {
    let engine = witness_engine();
    let mut interp = engine.interpreter();
    let w = interp.fresh_var().expect("var");
    let v = interp.fresh_var().expect("var");
    let l = interp.fresh_var().expect("var");
    let goal = app(
        "setof",
        vec![v.clone(), app("^", vec![w.clone(), app("p", vec![w.clone(), v.clone()])]), l.clone()],
    );
    assert_eq!(interp.solve(&goal).expect("ok"), PredicateResult::SuccessLast);
    assert_eq!(interp.resolve(&l), ints(&[1, 2, 3]));
    interp.stop();

    let goal = app("bagof", vec![v.clone(), app("p", vec![atom("none"), v]), l]);
    assert!(!succeeds(&mut interp, &goal));
}

#[test]
fn test_aggregate_all_specs() {
    let engine = witness_engine();
    let mut interp = engine.interpreter();
    let w = interp.fresh_var().expect("var");
    let v = interp.fresh_var().expect("var");
    let r = interp.fresh_var().expect("var");
    let p = app("p", vec![w.clone(), v.clone()]);
    let agg = |spec: Term| app("aggregate_all", vec![spec, p.clone(), r.clone()]);

    assert_eq!(once_resolved(&mut interp, &r, &agg(atom("count"))), Some(int(4)));
    assert_eq!(once_resolved(&mut interp, &r, &agg(app("sum", vec![v.clone()]))), Some(int(7)));
    assert_eq!(once_resolved(&mut interp, &r, &agg(app("max", vec![v.clone()]))), Some(int(3)));
    assert_eq!(once_resolved(&mut interp, &r, &agg(app("min", vec![v.clone()]))), Some(int(1)));
    assert_eq!(once_resolved(&mut interp, &r, &agg(app("bag", vec![v.clone()]))), Some(ints(&[1, 2, 3, 1])));
    assert_eq!(once_resolved(&mut interp, &r, &agg(app("set", vec![v.clone()]))), Some(ints(&[1, 2, 3])));

    let empty = app("aggregate_all", vec![app("max", vec![v]), atom("fail"), r.clone()]);
    assert!(!succeeds(&mut interp, &empty));
    let bad = app("aggregate_all", vec![atom("median"), atom("true"), r]);
    assert_eq!(error_kind(&mut interp, &bad), Some("domain_error"));
}

// ---------------------------------------------------------------------------
// Database and flags
// ---------------------------------------------------------------------------

#[test]
fn test_assert_and_retract() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    for i in 1..=3 {
        assert!(succeeds(&mut interp, &app("assertz", vec![app("counter", vec![int(i)])])));
    }
    assert!(succeeds(&mut interp, &app("asserta", vec![app("counter", vec![int(0)])])));
    let x = interp.fresh_var().expect("var");
    let all = app("counter", vec![x.clone()]);
    assert_eq!(interp.find_all(&x, &all).expect("ok"), vec![int(0), int(1), int(2), int(3)]);

    let goal = app("retract", vec![app("counter", vec![x.clone()])]);
    assert_eq!(once_resolved(&mut interp, &x, &goal), Some(int(0)));
    assert_eq!(interp.find_all(&x, &all).expect("ok"), vec![int(1), int(2), int(3)]);
    assert!(engine.database().is_dynamic(Tag::of("counter", 1)));

    let indicator = app("/", vec![atom("counter"), int(1)]);
    assert!(succeeds(&mut interp, &app("abolish", vec![indicator])));
    assert_eq!(error_kind(&mut interp, &all), Some("existence_error"));
}

#[test]
fn test_asserted_rule_is_callable() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let a = interp.fresh_var().expect("var");
    let b = interp.fresh_var().expect("var");
    // double(A, B) :- B is A * 2.
    let rule = app(
        ":-",
        vec![
            app("double", vec![a.clone(), b.clone()]),
            app("is", vec![b.clone(), app("*", vec![a, int(2)])]),
        ],
    );
    assert!(succeeds(&mut interp, &app("assertz", vec![rule])));
    let x = interp.fresh_var().expect("var");
    let goal = app("double", vec![int(21), x.clone()]);
    assert_eq!(once_resolved(&mut interp, &x, &goal), Some(int(42)));
}

#[test]
fn test_static_procedures_are_protected() {
    let engine = engine_with(vec![app("fact", vec![int(1)])]);
    let mut interp = engine.interpreter();
    let goal = app("assertz", vec![app("fact", vec![int(2)])]);
    assert_eq!(error_kind(&mut interp, &goal), Some("permission_error"));
    let goal = app("assertz", vec![app("append", vec![int(1), int(2), int(3)])]);
    assert_eq!(error_kind(&mut interp, &goal), Some("permission_error"));
    let goal = app("retract", vec![app("is", vec![int(1), int(1)])]);
    assert_eq!(error_kind(&mut interp, &goal), Some("permission_error"));
}

#[test]
fn test_dynamic_declaration_makes_calls_fail() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let specs = list(vec![
        app("/", vec![atom("seen"), int(1)]),
        app("/", vec![atom("visited"), int(2)]),
    ]);
    assert!(succeeds(&mut interp, &app("dynamic", vec![specs])));
    assert!(!succeeds(&mut interp, &app("seen", vec![int(1)])));
    assert!(!succeeds(&mut interp, &app("visited", vec![int(1), int(2)])));
}

#[test]
fn test_flags_enumerate_and_set() {
    let engine = Engine::new();
    let mut interp = engine.interpreter();
    let f = interp.fresh_var().expect("var");
    let value = interp.fresh_var().expect("var");
    let goal = app("current_prolog_flag", vec![f.clone(), value.clone()]);
    assert_eq!(interp.find_all(&f, &goal).expect("ok").len(), crate::backend::flags::FLAG_NAMES.len());

    let goal = app("current_prolog_flag", vec![atom("unknown"), value.clone()]);
    assert_eq!(once_resolved(&mut interp, &value, &goal), Some(atom("error")));
    assert!(succeeds(&mut interp, &app("set_prolog_flag", vec![atom("unknown"), atom("fail")])));
    assert!(!succeeds(&mut interp, &atom("no_such_predicate")));

    let bad = app("set_prolog_flag", vec![atom("bounded"), atom("true")]);
    assert_eq!(error_kind(&mut interp, &bad), Some("permission_error"));
}

#[test]
fn test_flags_come_from_config() {
    let engine = Engine::with_config(EngineConfig {
        occurs_check: true,
        ..EngineConfig::default()
    });
    let mut interp = engine.interpreter();
    let value = interp.fresh_var().expect("var");
    let goal = app("current_prolog_flag", vec![atom("occurs_check"), value.clone()]);
    assert_eq!(once_resolved(&mut interp, &value, &goal), Some(atom("true")));
}

#[test]
fn test_bagof_over_consulted_rule() {
    // tagged(K, V) :- p(w(K), V).
    let mut clauses = vec![app(
        ":-",
        vec![
            app("tagged", vec![v(0), v(1)]),
            app("p", vec![app("w", vec![v(0)]), v(1)]),
        ],
    )];
    clauses.extend([
        app("p", vec![app("w", vec![atom("a")]), int(1)]),
        app("p", vec![app("w", vec![atom("b")]), int(2)]),
        app("p", vec![app("w", vec![atom("a")]), int(3)]),
    ]);
    let engine = engine_with(clauses);
    let mut interp = engine.interpreter();
    let k = interp.fresh_var().expect("var");
    let val = interp.fresh_var().expect("var");
    let l = interp.fresh_var().expect("var");
    let goal = app("bagof", vec![val.clone(), app("tagged", vec![k.clone(), val]), l.clone()]);
    assert_eq!(
        interp.find_all(&app("-", vec![k, l]), &goal).expect("ok"),
        vec![
            app("-", vec![atom("a"), ints(&[1, 3])]),
            app("-", vec![atom("b"), ints(&[2])]),
        ]
    );
}
