//! List built-ins and the clause-defined list library.
//!
//! member/2 walks the bound cells of its list and, when it reaches an
//! unbound tail, keeps extending the list one cell per solution. Every other
//! predicate here needs a proper list where it reads one.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{atom_arg, check_list_output, integer_arg, list_arg, Alternative, Enumerate};
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::list::{list_from_vec, list_shape, ListShape};
use crate::backend::models::{Tag, Term, VarId};
use crate::backend::order::compare;
use crate::backend::predicate::{ExecResult, Predicate, PredicateResult};
use crate::backend::registry::PredicateRegistry;
use crate::backend::store::Store;

pub(super) fn register(registry: &PredicateRegistry) {
    registry.register(Tag::of("member", 2), Arc::new(Member));
    registry.register_det("memberchk", 2, memberchk);
    registry.register(Tag::of("length", 2), Arc::new(Length));
    registry.register_det("reverse", 2, reverse);
    registry.register(Tag::of("nth0", 3), Arc::new(Enumerate::new("nth0", |i, a| nth(i, a, 0))));
    registry.register(Tag::of("nth1", 3), Arc::new(Enumerate::new("nth1", |i, a| nth(i, a, 1))));
    registry.register_det("msort", 2, |i, a| sorted(i, a, false));
    registry.register_det("sort", 2, |i, a| sorted(i, a, true));
    registry.register_det("sort", 4, sort4);
    registry.register_det("keysort", 2, keysort);
}

/// Clauses loaded into every engine as static procedures:
///
/// ```text
/// append([], L, L).
/// append([H|T], L, [H|R]) :- append(T, L, R).
/// last([X|Xs], Last) :- '$last'(Xs, X, Last).
/// '$last'([], Last, Last).
/// '$last'([X|Xs], _, Last) :- '$last'(Xs, X, Last).
/// select(X, [X|T], T).
/// select(X, [H|T], [H|R]) :- select(X, T, R).
/// ```
pub fn library_clauses() -> Vec<Term> {
    let v = |n: u32| Term::Var(VarId(n));
    let rule = |head: Term, body: Term| Term::app(":-", vec![head, body]);
    let append = |a, b, c| Term::app("append", vec![a, b, c]);
    let last = |a, b, c| Term::app("$last", vec![a, b, c]);
    let select = |a, b, c| Term::app("select", vec![a, b, c]);
    vec![
        append(Term::nil(), v(0), v(0)),
        rule(
            append(Term::cons(v(0), v(1)), v(2), Term::cons(v(0), v(3))),
            append(v(1), v(2), v(3)),
        ),
        rule(
            Term::app("last", vec![Term::cons(v(0), v(1)), v(2)]),
            last(v(1), v(0), v(2)),
        ),
        last(Term::nil(), v(0), v(0)),
        rule(last(Term::cons(v(0), v(1)), v(2), v(3)), last(v(1), v(0), v(3))),
        select(v(0), Term::cons(v(0), v(1)), v(1)),
        rule(
            select(v(0), Term::cons(v(1), v(2)), Term::cons(v(1), v(3))),
            select(v(0), v(2), v(3)),
        ),
    ]
}

// ---------------------------------------------------------------------------
// member/2, memberchk/2
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Member;

#[derive(Debug)]
enum MemberNext {
    /// Continue with the remaining list
    Cell(Term),
    /// The element was placed in a cell that extended this open tail; skip
    /// that cell and extend again
    Open(Term),
}

#[derive(Debug)]
struct MemberChoice {
    elem: Term,
    next: MemberNext,
}

impl Predicate for Member {
    fn execute(&self, interp: &mut Interpreter, backtrack: bool, args: &[Term]) -> ExecResult {
        if !backtrack {
            return member_from(interp, args[0].clone(), args[1].clone());
        }
        let choice = interp.pop_choice::<MemberChoice>()?;
        match choice.next {
            MemberNext::Cell(rest) => member_from(interp, choice.elem, rest),
            MemberNext::Open(tail) => {
                interp.check_interrupt()?;
                let skipped = interp.fresh_var()?;
                let rest = interp.fresh_var()?;
                if !interp.unify(&tail, &Term::cons(skipped, rest.clone())) {
                    return Ok(PredicateResult::Fail);
                }
                member_from(interp, choice.elem, rest)
            }
        }
    }
}

fn member_from(interp: &mut Interpreter, elem: Term, mut list: Term) -> ExecResult {
    loop {
        let cell = interp.deref(&list);
        if cell.is_var() {
            let mark = interp.mark();
            let cells = interp.store().len();
            let rest = interp.fresh_var()?;
            if !interp.unify(&cell, &Term::cons(elem.clone(), rest)) {
                interp.undo_to(mark);
                return Ok(PredicateResult::Fail);
            }
            // The record only holds `cell`, so `rest` goes on backtracking.
            interp
                .choices
                .push(mark, cells, MemberChoice { elem, next: MemberNext::Open(cell) });
            return Ok(PredicateResult::Success);
        }
        let Some((head, tail)) = cell.as_cons() else {
            return Ok(PredicateResult::Fail);
        };
        // Decide before unifying: the unification may bind the tail.
        let last = interp.store().deref(tail).is_nil();
        let mark = interp.mark();
        if interp.unify(&elem, head) {
            if last {
                return Ok(PredicateResult::SuccessLast);
            }
            let next = MemberNext::Cell(tail.clone());
            interp.push_choice(mark, MemberChoice { elem, next });
            return Ok(PredicateResult::Success);
        }
        interp.undo_to(mark);
        list = tail.clone();
    }
}

fn memberchk(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let elem = &args[0];
    let mut list = args[1].clone();
    loop {
        let cell = interp.deref(&list);
        if cell.is_var() {
            let rest = interp.fresh_var()?;
            return Ok(interp.unify(&cell, &Term::cons(elem.clone(), rest)));
        }
        let Some((head, tail)) = cell.as_cons() else {
            return Ok(false);
        };
        if interp.unify_or_undo(elem, head) {
            return Ok(true);
        }
        list = tail.clone();
    }
}

// ---------------------------------------------------------------------------
// length/2
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Length;

#[derive(Debug)]
struct LengthChoice {
    tail: Term,
    count: Term,
    prefix: usize,
    extra: usize,
}

impl Predicate for Length {
    fn execute(&self, interp: &mut Interpreter, backtrack: bool, args: &[Term]) -> ExecResult {
        if backtrack {
            let choice = interp.pop_choice::<LengthChoice>()?;
            interp.check_interrupt()?;
            return extend_length(interp, choice);
        }
        let count = match interp.deref(&args[1]) {
            Term::Var(_) => None,
            _ => {
                let n = integer_arg(interp, &args[1])?;
                if n < 0 {
                    return Err(EngineError::domain_error("not_less_than_zero", Term::Integer(n)));
                }
                Some(n as usize)
            }
        };
        match (list_shape(interp.store(), &args[0]), count) {
            (ListShape::Proper(items), _) => {
                let len = Term::Integer(items.len() as i64);
                Ok(PredicateResult::from_bool(interp.unify(&args[1], &len)))
            }
            (ListShape::NotList, _) => Ok(PredicateResult::Fail),
            (ListShape::Partial(items, _), Some(n)) if n < items.len() => Ok(PredicateResult::Fail),
            (ListShape::Partial(items, tail), Some(n)) => {
                let cells = interp.store.fresh_vars(n - items.len())?;
                let ok = interp.unify(&Term::Var(tail), &list_from_vec(cells));
                Ok(PredicateResult::from_bool(ok))
            }
            (ListShape::Partial(items, tail), None) => extend_length(
                interp,
                LengthChoice {
                    tail: Term::Var(tail),
                    count: args[1].clone(),
                    prefix: items.len(),
                    extra: 0,
                },
            ),
        }
    }
}

/// Close the open tail with `extra` fresh cells; the next solution adds one more.
fn extend_length(interp: &mut Interpreter, choice: LengthChoice) -> ExecResult {
    let mark = interp.mark();
    let floor = interp.store().len();
    let cells = interp.store.fresh_vars(choice.extra)?;
    let total = Term::Integer((choice.prefix + choice.extra) as i64);
    if !(interp.unify(&choice.tail, &list_from_vec(cells)) && interp.unify(&choice.count, &total)) {
        interp.undo_to(mark);
        return Ok(PredicateResult::Fail);
    }
    let extra = choice.extra + 1;
    interp.choices.push(mark, floor, LengthChoice { extra, ..choice });
    Ok(PredicateResult::Success)
}

// ---------------------------------------------------------------------------
// reverse/2, nth0/3, nth1/3
// ---------------------------------------------------------------------------

fn reverse(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let mut items = list_arg(interp, &args[0])?;
    items.reverse();
    Ok(interp.unify(&args[1], &list_from_vec(items)))
}

fn nth(interp: &mut Interpreter, args: &[Term], base: i64) -> EngineResult<Vec<Alternative>> {
    let index = match interp.deref(&args[0]) {
        Term::Var(_) => None,
        _ => Some(integer_arg(interp, &args[0])?),
    };
    match index {
        Some(i) if i < base => Err(EngineError::type_error(
            "not_less_than_zero",
            Term::Integer(i),
        )),
        Some(i) => {
            let position = (i - base) as usize;
            let items = match list_shape(interp.store(), &args[1]) {
                ListShape::Proper(items) => items,
                ListShape::Partial(items, _) if position < items.len() => items,
                ListShape::Partial(..) => return Err(EngineError::instantiation()),
                ListShape::NotList => return Err(EngineError::type_error("list", interp.resolve(&args[1]))),
            };
            Ok(items
                .get(position)
                .map(|item| vec![vec![(args[2].clone(), item.clone())]])
                .unwrap_or_default())
        }
        None => {
            let items = list_arg(interp, &args[1])?;
            Ok(items
                .into_iter()
                .zip(base..)
                .map(|(item, i)| vec![(args[0].clone(), Term::Integer(i)), (args[2].clone(), item)])
                .collect())
        }
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

fn dedup_sorted(store: &Store, items: &mut Vec<Term>) {
    items.dedup_by(|a, b| compare(store, a, b) == Ordering::Equal);
}

/// msort/2 (`dedup == false`) and sort/2
fn sorted(interp: &mut Interpreter, args: &[Term], dedup: bool) -> EngineResult<bool> {
    let mut items = list_arg(interp, &args[0])?;
    check_list_output(interp, &args[1])?;
    let store = interp.store();
    items.sort_by(|a, b| compare(store, a, b));
    if dedup {
        dedup_sorted(store, &mut items);
    }
    Ok(interp.unify(&args[1], &list_from_vec(items)))
}

/// sort(Key, Order, List, Sorted)
fn sort4(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let key = integer_arg(interp, &args[0])?;
    if key < 0 {
        return Err(EngineError::domain_error("not_less_than_zero", Term::Integer(key)));
    }
    let order = atom_arg(interp, &args[1])?;
    let (descending, dedup) = match order.as_str() {
        "@<" => (false, true),
        "@=<" => (false, false),
        "@>" => (true, true),
        "@>=" => (true, false),
        _ => return Err(EngineError::domain_error("order", Term::Atom(order))),
    };
    let items = list_arg(interp, &args[2])?;
    check_list_output(interp, &args[3])?;

    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let k = if key == 0 {
            item.clone()
        } else {
            match &item {
                Term::Var(_) => return Err(EngineError::instantiation()),
                Term::Compound(c) => c
                    .arg(key as usize - 1)
                    .cloned()
                    .ok_or_else(|| EngineError::type_error("compound", item.clone()))?,
                other => return Err(EngineError::type_error("compound", other.clone())),
            }
        };
        keyed.push((k, item));
    }

    let store = interp.store();
    keyed.sort_by(|(a, _), (b, _)| {
        let ord = compare(store, a, b);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    if dedup {
        keyed.dedup_by(|(a, _), (b, _)| compare(store, a, b) == Ordering::Equal);
    }
    let result = list_from_vec(keyed.into_iter().map(|(_, item)| item).collect());
    Ok(interp.unify(&args[3], &result))
}

fn keysort(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let items = list_arg(interp, &args[0])?;
    check_list_output(interp, &args[1])?;
    let mut pairs = Vec::with_capacity(items.len());
    for item in items {
        match &item {
            Term::Var(_) => return Err(EngineError::instantiation()),
            Term::Compound(c) if c.tag() == Tag::of("-", 2) => {
                pairs.push((c.args()[0].clone(), item.clone()));
            }
            other => return Err(EngineError::type_error("pair", other.clone())),
        }
    }
    let store = interp.store();
    pairs.sort_by(|(a, _), (b, _)| compare(store, a, b));
    let result = list_from_vec(pairs.into_iter().map(|(_, pair)| pair).collect());
    Ok(interp.unify(&args[1], &result))
}
