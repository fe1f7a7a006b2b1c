//! Calls and cut.
//!
//! A call whose continuation is `proceed`, made while the activation has no
//! alternatives of its own, to a predicate defined by clauses, reuses the
//! activation instead of nesting a new one. Deterministic recursion then runs
//! in constant native stack.

use std::sync::Arc;

use tracing::trace;

use super::{Activation, FrameChoice, Step};
use crate::backend::bytecode::opcodes::Opcode;
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::{Tag, Term};
use crate::backend::predicate::{Predicate, PredicateResult};

impl Activation {
    /// `call tag`: pop the arguments and invoke the predicate.
    pub(super) fn op_call(&mut self, interp: &mut Interpreter, index: u32) -> EngineResult<Step> {
        let tag = self
            .code()?
            .chunk()
            .tag(index)
            .ok_or_else(|| EngineError::system_error(format!("invalid tag #{}", index)))?;
        let arity = tag.arity as usize;
        if self.frame.operands.len() < arity {
            return Err(EngineError::system_error("operand stack underflow"));
        }
        let split = self.frame.operands.len() - arity;
        let args: Arc<[Term]> = self.frame.operands.drain(split..).collect();
        let predicate = interp
            .resolve_predicate(tag)
            .map_err(|err| err.in_predicate(tag))?;

        if self.is_last_call(interp)? {
            if let Some(compiled) = predicate.as_compiled() {
                trace!(target: "prologtron::vm", %tag, "last call");
                self.code = Some(Arc::clone(compiled.code()));
                self.args = args;
                return self.enter_clauses(interp);
            }
        }

        let result = predicate
            .execute(interp, false, &args)
            .map_err(|err| err.in_predicate(tag))?;
        self.after_call(interp, tag, predicate, args, result)
    }

    /// Continue after a call returned. A callee that succeeded with
    /// alternatives gets a call record above its own.
    pub(super) fn after_call(
        &mut self,
        interp: &mut Interpreter,
        tag: Tag,
        predicate: Arc<dyn Predicate>,
        args: Arc<[Term]>,
        result: PredicateResult,
    ) -> EngineResult<Step> {
        match result {
            PredicateResult::Fail => Ok(Step::Backtrack),
            PredicateResult::SuccessLast => Ok(Step::Next),
            PredicateResult::Success => {
                let code = Arc::clone(self.code()?);
                let mark = interp.mark();
                interp.push_choice(
                    mark,
                    FrameChoice::Call {
                        code,
                        pc: self.pc,
                        tag,
                        predicate,
                        args,
                        frame: self.frame.clone(),
                    },
                );
                Ok(Step::Next)
            }
        }
    }

    fn is_last_call(&self, interp: &Interpreter) -> EngineResult<bool> {
        if interp.choices.height() != self.entry_height {
            return Ok(false);
        }
        Ok(self.code()?.chunk().read_opcode(self.pc) == Some(Opcode::Proceed))
    }

    /// Discard every record above `height`.
    pub(super) fn op_cut(&mut self, interp: &mut Interpreter, height: usize) {
        if interp.choices.height() > height {
            trace!(
                target: "prologtron::vm::nondet",
                tag = %self.tag,
                discarded = interp.choices.height() - height,
                "cut"
            );
            interp.choices.cut_to(height);
        }
    }
}
