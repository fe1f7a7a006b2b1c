//! All-solutions predicates: findall/3,4, bagof/3, setof/3, aggregate_all/3.
//!
//! Everything here is built on [`collect_all`], which runs a goal to
//! exhaustion and keeps a renamed copy of the template per solution. The
//! bindings made while enumerating never escape it.
//!
//! bagof/setof group solutions by the bindings of the goal's free variables
//! (those neither in the template nor existentially quantified with `^`).
//! The free variables are packed into a `'$witness'(...)` term collected
//! alongside the template; solutions whose witnesses are variants of each
//! other form one group, and groups are produced in order of first
//! appearance, one per solution.

use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::trace;

use super::arith::{self, num_cmp, Number};
use super::{callable_arg, check_list_output};
use crate::backend::copy::term_variables;
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::list::{list_from_vec, list_with_tail};
use crate::backend::models::template::{detach, substitute};
use crate::backend::models::{Tag, Term, VarId};
use crate::backend::order::{compare, is_variant};
use crate::backend::predicate::{ExecResult, Predicate, PredicateResult};
use crate::backend::registry::PredicateRegistry;
use crate::backend::store::Store;
use crate::backend::symbol::atoms;

pub(super) fn register(registry: &PredicateRegistry) {
    registry.register_det("findall", 3, findall);
    registry.register_det("findall", 4, findall4);
    registry.register(Tag::of("bagof", 3), Arc::new(Bagof { set: false }));
    registry.register(Tag::of("setof", 3), Arc::new(Bagof { set: true }));
    registry.register_det("aggregate_all", 3, aggregate_all);
}

/// Run `goal` to exhaustion, returning a copy of `template` per solution in
/// enumeration order. The trail and choice stack are left as they were,
/// also when the goal raises, and the cells the goal allocated are released.
pub fn collect_all(interp: &mut Interpreter, template: &Term, goal: &Term) -> EngineResult<Vec<Term>> {
    let checkpoint = interp.checkpoint();
    // Copies are held detached: resuming the goal releases newer cells.
    let mut detached = Vec::new();
    let mut outcome = interp.call_goal(goal);
    loop {
        match outcome {
            Ok(PredicateResult::Fail) => break,
            Ok(result) => {
                detached.push(detach(interp.store(), template));
                if result == PredicateResult::SuccessLast {
                    break;
                }
                outcome = interp.redo_goal();
            }
            Err(err) => {
                interp.rollback(checkpoint);
                return Err(err);
            }
        }
    }
    interp.rollback(checkpoint);
    trace!(target: "prologtron::solutions", solutions = detached.len(), "collected");
    detached
        .iter()
        .map(|(term, count)| attach(interp, term, *count))
        .collect()
}

fn attach(interp: &mut Interpreter, term: &Term, count: u32) -> EngineResult<Term> {
    if count == 0 {
        return Ok(term.clone());
    }
    let fresh = interp.store.fresh_vars(count as usize)?;
    Ok(substitute(term, &fresh))
}

fn findall(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    check_list_output(interp, &args[2])?;
    let goal = callable_arg(interp, &args[1])?;
    let results = collect_all(interp, &args[0], &goal)?;
    Ok(interp.unify(&args[2], &list_from_vec(results)))
}

/// findall/4: the solutions form a difference list ending in `Tail`.
fn findall4(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    check_list_output(interp, &args[2])?;
    let goal = callable_arg(interp, &args[1])?;
    let results = collect_all(interp, &args[0], &goal)?;
    Ok(interp.unify(&args[2], &list_with_tail(results, args[3].clone())))
}

fn sort_unique(store: &Store, items: &mut Vec<Term>) {
    items.sort_by(|a, b| compare(store, a, b));
    items.dedup_by(|a, b| compare(store, a, b) == Ordering::Equal);
}

// ---------------------------------------------------------------------------
// bagof/3, setof/3
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Bagof {
    set: bool,
}

/// One witness group: `(witness, template)` copies in solution order
type Group = Vec<(Term, Term)>;

#[derive(Debug)]
struct BagofChoice {
    groups: VecDeque<Group>,
    witness: Term,
    result: Term,
    set: bool,
}

impl Predicate for Bagof {
    fn execute(&self, interp: &mut Interpreter, backtrack: bool, args: &[Term]) -> ExecResult {
        if backtrack {
            let choice = interp.pop_choice::<BagofChoice>()?;
            return next_group(interp, choice);
        }

        let template = &args[0];
        let result = &args[2];
        check_list_output(interp, result)?;
        let (goal, bound) = strip_existential(interp, &args[1])?;
        let free = free_variables(interp.store(), template, &goal, &bound);

        if free.is_empty() {
            let mut items = collect_all(interp, template, &goal)?;
            if items.is_empty() {
                return Ok(PredicateResult::Fail);
            }
            if self.set {
                sort_unique(interp.store(), &mut items);
            }
            return Ok(PredicateResult::from_bool(
                interp.unify(result, &list_from_vec(items)),
            ));
        }

        let witness = Term::app_atom(atoms().witness, free.into_iter().map(Term::Var).collect());
        let paired = Term::pair(witness.clone(), template.clone());
        let solutions = collect_all(interp, &paired, &goal)?;
        if solutions.is_empty() {
            return Ok(PredicateResult::Fail);
        }
        let groups = group_by_witness(interp.store(), solutions);
        trace!(target: "prologtron::solutions", groups = groups.len(), set = self.set, "grouped");
        next_group(
            interp,
            BagofChoice {
                groups,
                witness,
                result: result.clone(),
                set: self.set,
            },
        )
    }
}

/// Peel `V^Goal` prefixes; returns the inner goal and the quantified terms.
fn strip_existential(interp: &Interpreter, goal: &Term) -> EngineResult<(Term, Vec<Term>)> {
    let mut bound = Vec::new();
    let mut goal = callable_arg(interp, goal)?;
    loop {
        let inner = match goal.as_compound() {
            Some(c) if c.functor() == atoms().caret && c.arity() == 2 => {
                bound.push(c.args()[0].clone());
                c.args()[1].clone()
            }
            _ => break,
        };
        goal = callable_arg(interp, &inner)?;
    }
    Ok((goal, bound))
}

/// Variables of `goal` that occur neither in `template` nor in `bound`, in
/// order of first occurrence.
fn free_variables(store: &Store, template: &Term, goal: &Term, bound: &[Term]) -> Vec<VarId> {
    let mut excluded: HashSet<VarId> = term_variables(store, template).into_iter().collect();
    for term in bound {
        excluded.extend(term_variables(store, term));
    }
    term_variables(store, goal)
        .into_iter()
        .filter(|v| !excluded.contains(v))
        .collect()
}

/// Split `Witness-Template` solutions into groups of variant witnesses,
/// keeping first-appearance order.
fn group_by_witness(store: &Store, solutions: Vec<Term>) -> VecDeque<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for solution in solutions {
        let (witness, item) = match solution.args() {
            [w, t] => (w.clone(), t.clone()),
            _ => continue,
        };
        match groups.iter_mut().find(|g| is_variant(store, &g[0].0, &witness)) {
            Some(group) => group.push((witness, item)),
            None => groups.push(vec![(witness, item)]),
        }
    }
    groups.into()
}

/// Produce the next group that unifies with the caller's witness and result.
fn next_group(interp: &mut Interpreter, mut choice: BagofChoice) -> ExecResult {
    while let Some(group) = choice.groups.pop_front() {
        let mark = interp.mark();
        let mut ok = group.iter().all(|(w, _)| interp.unify(&choice.witness, w));
        if ok {
            let mut items: Vec<Term> = group.into_iter().map(|(_, t)| t).collect();
            if choice.set {
                sort_unique(interp.store(), &mut items);
            }
            ok = interp.unify(&choice.result, &list_from_vec(items));
        }
        if !ok {
            interp.undo_to(mark);
            continue;
        }
        if choice.groups.is_empty() {
            return Ok(PredicateResult::SuccessLast);
        }
        interp.push_choice(mark, choice);
        return Ok(PredicateResult::Success);
    }
    Ok(PredicateResult::Fail)
}

// ---------------------------------------------------------------------------
// aggregate_all/3
// ---------------------------------------------------------------------------

/// aggregate_all(count | sum(E) | max(E) | min(E) | bag(T) | set(T), Goal, Result)
fn aggregate_all(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let spec = interp.deref(&args[0]);
    let goal = callable_arg(interp, &args[1])?;
    let (kind, template) = match &spec {
        Term::Var(_) => return Err(EngineError::instantiation()),
        Term::Atom(a) if a.as_str() == "count" => ("count", Term::nil()),
        Term::Compound(c) if c.arity() == 1 => (c.functor().as_str(), c.args()[0].clone()),
        _ => return Err(EngineError::domain_error("aggregate_spec", spec.clone())),
    };
    if !matches!(kind, "count" | "sum" | "max" | "min" | "bag" | "set") {
        return Err(EngineError::domain_error("aggregate_spec", spec.clone()));
    }

    let mut items = collect_all(interp, &template, &goal)?;
    let value = match kind {
        "count" => Term::Integer(items.len() as i64),
        "bag" => list_from_vec(items),
        "set" => {
            sort_unique(interp.store(), &mut items);
            list_from_vec(items)
        }
        "sum" => {
            let mut total = Number::Int(0);
            for item in &items {
                total = arith::add(total, arith::eval(interp, item)?)?;
            }
            total.into_term()
        }
        _ => {
            let want = if kind == "max" { Ordering::Greater } else { Ordering::Less };
            let mut best: Option<Number> = None;
            for item in &items {
                let n = arith::eval(interp, item)?;
                best = match best {
                    Some(b) if num_cmp(&n, &b) != Some(want) => Some(b),
                    _ => Some(n),
                };
            }
            match best {
                Some(n) => n.into_term(),
                None => return Ok(false),
            }
        }
    };
    Ok(interp.unify(&args[2], &value))
}
