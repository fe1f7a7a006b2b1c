//! catch/3 and throw/1.
//!
//! `catch(Goal, Catcher, Recovery)` stays active while `Goal` has
//! alternatives: when `Goal` succeeds with alternatives, its records are set
//! aside in a [`CatchChoice`] so a ball raised on backtracking into `Goal` is
//! still intercepted. A ball is caught by restoring the state at entry and
//! unifying a copy of it with `Catcher`.

use std::sync::Arc;

use tracing::debug;

use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::{Checkpoint, Interpreter};
use crate::backend::models::template::{detach, substitute};
use crate::backend::models::{Tag, Term};
use crate::backend::predicate::{ChoicePoint, ExecResult, Predicate, PredicateResult};
use crate::backend::registry::PredicateRegistry;

pub(super) fn register(registry: &PredicateRegistry) {
    registry.register(Tag::of("catch", 3), Arc::new(Catch));
    registry.register_det("throw", 1, throw);
}

fn throw(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let ball = interp.deref(&args[0]);
    if ball.is_var() {
        return Err(EngineError::instantiation());
    }
    Err(EngineError::Thrown(interp.resolve(&ball)))
}

#[derive(Debug)]
enum Phase {
    /// Still protecting the goal
    Goal { catcher: Term, recovery: Term },
    /// Running the recovery goal, which is not protected
    Recovery,
}

#[derive(Debug)]
struct CatchChoice {
    checkpoint: Checkpoint,
    phase: Phase,
    inner: Vec<ChoicePoint>,
}

#[derive(Debug)]
struct Catch;

impl Predicate for Catch {
    fn execute(&self, interp: &mut Interpreter, backtrack: bool, args: &[Term]) -> ExecResult {
        if backtrack {
            let choice = interp.pop_choice::<CatchChoice>()?;
            interp.choices.restore(choice.inner);
            let result = interp.redo_goal();
            return match choice.phase {
                Phase::Goal { catcher, recovery } => {
                    handle(interp, choice.checkpoint, catcher, recovery, result)
                }
                Phase::Recovery => seal(interp, choice.checkpoint, Phase::Recovery, result),
            };
        }
        let checkpoint = interp.checkpoint();
        let result = interp.call_goal(&args[0]);
        handle(interp, checkpoint, args[1].clone(), args[2].clone(), result)
    }
}

/// Outcome of running or resuming the protected goal
fn handle(
    interp: &mut Interpreter,
    checkpoint: Checkpoint,
    catcher: Term,
    recovery: Term,
    result: ExecResult,
) -> ExecResult {
    match result {
        Err(EngineError::Thrown(ball)) => {
            let (detached, count) = detach(interp.store(), &ball);
            interp.rollback(checkpoint);
            let ball = if count == 0 {
                detached
            } else {
                let fresh = interp.store.fresh_vars(count as usize)?;
                substitute(&detached, &fresh)
            };
            let mark = interp.mark();
            if !interp.unify(&catcher, &ball) {
                interp.undo_to(mark);
                return Err(EngineError::Thrown(ball));
            }
            debug!(target: "prologtron::builtins::catch", ball = %interp.resolve(&ball), "caught");
            let result = interp.call_goal(&recovery);
            seal(interp, checkpoint, Phase::Recovery, result)
        }
        other => seal(interp, checkpoint, Phase::Goal { catcher, recovery }, other),
    }
}

/// On `Success`, replace the records above the checkpoint with one
/// [`CatchChoice`].
fn seal(interp: &mut Interpreter, checkpoint: Checkpoint, phase: Phase, result: ExecResult) -> ExecResult {
    let outcome = result?;
    if outcome != PredicateResult::Success {
        return Ok(outcome);
    }
    let inner = interp.choices.take_above(checkpoint.height);
    let (mark, cells) = inner
        .last()
        .map(|p| (p.mark, p.cells))
        .unwrap_or((checkpoint.mark, checkpoint.cells));
    interp.choices.push(mark, cells, CatchChoice { checkpoint, phase, inner });
    Ok(PredicateResult::Success)
}
