//! Clause selection, disjunction alternatives and backtracking.

use std::sync::Arc;

use tracing::trace;

use super::{Activation, Frame, FrameChoice, Step};
use crate::backend::bytecode::compiler::PredicateCode;
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::Term;

impl Activation {
    /// Pick the clauses of the current predicate that may match the current
    /// arguments and enter the first one.
    pub(super) fn enter_clauses(&mut self, interp: &mut Interpreter) -> EngineResult<Step> {
        let code = Arc::clone(self.code()?);
        let candidates: Arc<[usize]> = {
            let first = self.args.first().map(|arg| interp.store.deref(arg));
            code.candidates(first).into()
        };
        let args = Arc::clone(&self.args);
        self.try_clause(interp, code, args, candidates, 0)
    }

    /// Enter candidate `next`, leaving a record for the rest if any remain.
    fn try_clause(
        &mut self,
        interp: &mut Interpreter,
        code: Arc<PredicateCode>,
        args: Arc<[Term]>,
        candidates: Arc<[usize]>,
        next: usize,
    ) -> EngineResult<Step> {
        let Some(&index) = candidates.get(next) else {
            return Ok(Step::Backtrack);
        };
        let entry = code
            .clause(index)
            .map(|clause| clause.entry)
            .ok_or_else(|| EngineError::system_error(format!("invalid clause index {}", index)))?;
        if next + 1 < candidates.len() {
            trace!(
                target: "prologtron::vm::nondet",
                tag = %code.tag(),
                clause = index,
                remaining = candidates.len() - next - 1,
                "clause alternatives"
            );
            let mark = interp.mark();
            interp.push_choice(
                mark,
                FrameChoice::Clauses {
                    code: Arc::clone(&code),
                    args: Arc::clone(&args),
                    candidates,
                    next: next + 1,
                },
            );
        }
        self.tag = code.tag();
        self.code = Some(code);
        self.args = args;
        self.frame = Frame::default();
        Ok(Step::Jump(entry))
    }

    /// `try_me_else target`: remember the other branch with the current frame.
    pub(super) fn op_try_me_else(&mut self, interp: &mut Interpreter, target: usize) -> EngineResult<()> {
        let code = Arc::clone(self.code()?);
        let mark = interp.mark();
        interp.push_choice(
            mark,
            FrameChoice::Alternative {
                code,
                pc: target,
                frame: self.frame.clone(),
            },
        );
        Ok(())
    }

    /// Resume the newest record of this activation. `None` when the
    /// activation has no alternatives left.
    pub(super) fn backtrack(&mut self, interp: &mut Interpreter) -> EngineResult<Option<Step>> {
        if interp.choices.height() <= self.entry_height {
            return Ok(None);
        }
        let choice = interp.pop_choice::<FrameChoice>()?;
        match choice {
            FrameChoice::Clauses {
                code,
                args,
                candidates,
                next,
            } => self.try_clause(interp, code, args, candidates, next).map(Some),
            FrameChoice::Alternative { code, pc, frame } => {
                self.code = Some(code);
                self.frame = frame;
                Ok(Some(Step::Jump(pc)))
            }
            FrameChoice::Call {
                code,
                pc,
                tag,
                predicate,
                args,
                frame,
            } => {
                self.code = Some(code);
                self.frame = frame;
                self.pc = pc;
                trace!(target: "prologtron::vm::nondet", %tag, "redo call");
                let result = predicate
                    .execute(interp, true, &args)
                    .map_err(|err| err.in_predicate(tag))?;
                Ok(Some(self.after_call(interp, tag, predicate, args, result)?))
            }
        }
    }
}
