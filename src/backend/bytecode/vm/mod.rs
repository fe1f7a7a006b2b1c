//! Clause VM
//!
//! Each call of a compiled predicate runs an *activation*: a program counter
//! into the predicate's chunk, an environment frame of clause variables, an
//! operand stack, and the choice stack height at entry. The driver loop moves
//! between four states (see [`Step`]) until the clause body proceeds or no
//! alternative of the activation is left.
//!
//! Records pushed during the activation live on the shared choice stack above
//! the entry height. When the body proceeds with some of them still present,
//! they are set aside into one [`ActivationChoice`], so the predicate leaves
//! exactly one record of its own, as the protocol requires. Resuming puts
//! them back and backtracks into the newest.
//!
//! This module is organized into submodules by functionality:
//! - `types`: driver states, frames and choice records
//! - `control_flow`: calls, last-call reuse and cut
//! - `nondeterminism`: clause selection, alternatives and backtracking

use std::sync::Arc;

use smallvec::smallvec;
use tracing::{debug, trace};

use super::compiler::{CompiledPredicate, PredicateCode};
use super::opcodes::Opcode;
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::{Compound, Tag, Term};
use crate::backend::predicate::{ExecResult, Predicate, PredicateResult};
use crate::backend::store::TrailMark;

mod control_flow;
mod nondeterminism;
mod types;


pub use types::Step;
pub(crate) use types::{ActivationChoice, Frame, FrameChoice};

impl Predicate for CompiledPredicate {
    fn execute(&self, interp: &mut Interpreter, backtrack: bool, args: &[Term]) -> ExecResult {
        if backtrack {
            resume_compiled(interp)
        } else {
            call_compiled(self.code(), interp, args)
        }
    }

    fn as_compiled(&self) -> Option<&CompiledPredicate> {
        Some(self)
    }
}

/// Native stack left when a nested activation asks for a new segment
const STACK_RED_ZONE: usize = 256 * 1024;

/// Size of each native stack segment added for nested activations
const STACK_SEGMENT: usize = 4 * 1024 * 1024;

/// First call of a compiled predicate.
///
/// Every nested call and every nested `redo` goes through this function or
/// [`resume_compiled`], so growing the native stack here keeps deep
/// recursion bounded by `max_call_depth` alone.
pub fn call_compiled(code: &Arc<PredicateCode>, interp: &mut Interpreter, args: &[Term]) -> ExecResult {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || {
        interp.enter_call()?;
        let mut activation = Activation::new(
            Arc::clone(code),
            Arc::from(args),
            interp.choices.height(),
            interp.trail.mark(),
        );
        let result = match activation.enter_clauses(interp) {
            Ok(first) => activation.run(interp, first),
            Err(err) => Err(activation.unwind(interp, err)),
        };
        interp.leave_call();
        result
    })
}

/// Resume the compiled predicate whose [`ActivationChoice`] is on top of the
/// choice stack.
pub fn resume_compiled(interp: &mut Interpreter) -> ExecResult {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || {
        let choice = interp.pop_choice::<ActivationChoice>()?;
        trace!(target: "prologtron::vm::nondet", tag = %choice.tag, records = choice.inner.len(), "resume activation");
        interp.enter_call()?;
        let entry_height = interp.choices.height();
        interp.choices.restore(choice.inner);
        let mut activation = Activation::resumed(choice.tag, entry_height, choice.entry_mark);
        let result = activation.run(interp, Step::Backtrack);
        interp.leave_call();
        result
    })
}

/// One running call of a compiled predicate
pub(crate) struct Activation {
    tag: Tag,
    code: Option<Arc<PredicateCode>>,
    args: Arc<[Term]>,
    pc: usize,
    frame: Frame,
    entry_height: usize,
    entry_mark: TrailMark,
}

impl Activation {
    fn new(code: Arc<PredicateCode>, args: Arc<[Term]>, entry_height: usize, entry_mark: TrailMark) -> Self {
        Activation {
            tag: code.tag(),
            code: Some(code),
            args,
            pc: 0,
            frame: Frame::default(),
            entry_height,
            entry_mark,
        }
    }

    /// An activation rebuilt from its set-aside records; its code is taken
    /// from the first record it resumes.
    fn resumed(tag: Tag, entry_height: usize, entry_mark: TrailMark) -> Self {
        Activation {
            tag,
            code: None,
            args: Arc::from(Vec::new()),
            pc: 0,
            frame: Frame::default(),
            entry_height,
            entry_mark,
        }
    }

    fn code(&self) -> EngineResult<&Arc<PredicateCode>> {
        self.code
            .as_ref()
            .ok_or_else(|| EngineError::system_error("activation has no code"))
    }

    /// The driver loop.
    fn run(&mut self, interp: &mut Interpreter, first: Step) -> ExecResult {
        let mut step = first;
        loop {
            let outcome = match step {
                Step::Next => self.execute_instruction(interp),
                Step::Jump(target) => {
                    self.pc = target;
                    self.execute_instruction(interp)
                }
                Step::Backtrack => match self.backtrack(interp) {
                    Ok(Some(next)) => Ok(next),
                    Ok(None) => {
                        interp.trail.undo_to(self.entry_mark, &mut interp.store);
                        return Ok(PredicateResult::Fail);
                    }
                    Err(err) => Err(err),
                },
                Step::Return => return Ok(self.exit(interp)),
            };
            step = match outcome {
                Ok(next) => next,
                Err(err) => return Err(self.unwind(interp, err)),
            };
        }
    }

    /// Restore the state at entry before an error leaves the activation.
    fn unwind(&mut self, interp: &mut Interpreter, err: EngineError) -> EngineError {
        interp.choices.cut_to(self.entry_height);
        interp.trail.undo_to(self.entry_mark, &mut interp.store);
        debug!(target: "prologtron::vm", tag = %self.tag, error = %err, "activation unwound");
        err
    }

    /// The body proceeded: succeed, setting aside any records left behind.
    fn exit(&mut self, interp: &mut Interpreter) -> PredicateResult {
        if interp.choices.height() <= self.entry_height {
            return PredicateResult::SuccessLast;
        }
        let inner = interp.choices.take_above(self.entry_height);
        let (mark, cells) = inner
            .last()
            .map(|p| (p.mark, p.cells))
            .unwrap_or((self.entry_mark, interp.store.len()));
        trace!(target: "prologtron::vm::nondet", tag = %self.tag, records = inner.len(), "activation exits with alternatives");
        interp.choices.push(
            mark,
            cells,
            ActivationChoice {
                tag: self.tag,
                entry_mark: self.entry_mark,
                inner,
            },
        );
        PredicateResult::Success
    }

    fn pop_operand(&mut self) -> EngineResult<Term> {
        self.frame
            .operands
            .pop()
            .ok_or_else(|| EngineError::system_error("operand stack underflow"))
    }

    fn read_u16(&mut self) -> EngineResult<u16> {
        let value = self.code()?.chunk().read_u16(self.pc);
        self.pc += 2;
        value.ok_or_else(|| EngineError::system_error("truncated instruction"))
    }

    fn read_u32(&mut self) -> EngineResult<u32> {
        let value = self.code()?.chunk().read_u32(self.pc);
        self.pc += 4;
        value.ok_or_else(|| EngineError::system_error("truncated instruction"))
    }

    /// Decode and execute the instruction at the program counter.
    fn execute_instruction(&mut self, interp: &mut Interpreter) -> EngineResult<Step> {
        interp.check_interrupt()?;
        let opcode = self
            .code()?
            .chunk()
            .read_opcode(self.pc)
            .ok_or_else(|| EngineError::system_error(format!("invalid opcode at {}", self.pc)))?;
        if interp.tracing() {
            trace!(target: "prologtron::vm::step", pc = self.pc, op = %opcode, depth = interp.depth());
        }
        self.pc += 1;

        match opcode {
            Opcode::Nop | Opcode::TrustMe => Ok(Step::Next),
            Opcode::PushConstant => {
                let index = self.read_u32()?;
                let constant = self
                    .code()?
                    .chunk()
                    .constant(index)
                    .cloned()
                    .ok_or_else(|| EngineError::system_error(format!("invalid constant #{}", index)))?;
                self.frame.operands.push(constant);
                Ok(Step::Next)
            }
            Opcode::PushEnv => {
                let slot = self.read_u16()? as usize;
                let term = self
                    .frame
                    .env
                    .get(slot)
                    .cloned()
                    .ok_or_else(|| EngineError::system_error(format!("invalid environment slot {}", slot)))?;
                self.frame.operands.push(term);
                Ok(Step::Next)
            }
            Opcode::CreateVariable => {
                let var = interp.store.fresh_var()?;
                self.frame.operands.push(var);
                Ok(Step::Next)
            }
            Opcode::CreateCompound => {
                let index = self.read_u32()?;
                self.create_compound(interp, index)?;
                Ok(Step::Next)
            }
            Opcode::Allocate => {
                let count = self.read_u16()? as usize;
                let registers = self.code()?.chunk().register_count() as usize;
                self.frame.env = interp.store.fresh_vars(count)?;
                self.frame.operands.clear();
                self.frame.registers = smallvec![self.entry_height; registers];
                Ok(Step::Next)
            }
            Opcode::UnifyArg => {
                let index = self.read_u16()? as usize;
                let term = self.pop_operand()?;
                let arg = self
                    .args
                    .get(index)
                    .cloned()
                    .ok_or_else(|| EngineError::system_error(format!("invalid argument {}", index)))?;
                Ok(if interp.unify(&term, &arg) {
                    Step::Next
                } else {
                    Step::Backtrack
                })
            }
            Opcode::BindArg => {
                let slot = self.read_u16()? as usize;
                let index = self.read_u16()? as usize;
                let arg = self
                    .args
                    .get(index)
                    .cloned()
                    .ok_or_else(|| EngineError::system_error(format!("invalid argument {}", index)))?;
                match self.frame.env.get_mut(slot) {
                    Some(cell) => *cell = arg,
                    None => return Err(EngineError::system_error(format!("invalid environment slot {}", slot))),
                }
                Ok(Step::Next)
            }
            Opcode::Call => {
                let index = self.read_u32()?;
                self.op_call(interp, index)
            }
            Opcode::Jump => {
                let target = self.read_u32()? as usize;
                Ok(Step::Jump(target))
            }
            Opcode::Proceed => Ok(Step::Return),
            Opcode::TryMeElse => {
                let target = self.read_u32()? as usize;
                self.op_try_me_else(interp, target)?;
                Ok(Step::Next)
            }
            Opcode::MarkChoice => {
                let register = self.read_u16()? as usize;
                let height = interp.choices.height();
                match self.frame.registers.get_mut(register) {
                    Some(slot) => *slot = height,
                    None => return Err(EngineError::system_error(format!("invalid cut register {}", register))),
                }
                Ok(Step::Next)
            }
            Opcode::CutTo => {
                let register = self.read_u16()? as usize;
                let height = self
                    .frame
                    .registers
                    .get(register)
                    .copied()
                    .ok_or_else(|| EngineError::system_error(format!("invalid cut register {}", register)))?;
                self.op_cut(interp, height);
                Ok(Step::Next)
            }
            Opcode::Cut => {
                self.op_cut(interp, self.entry_height);
                Ok(Step::Next)
            }
            Opcode::Fail => Ok(Step::Backtrack),
        }
    }

    fn create_compound(&mut self, interp: &mut Interpreter, index: u32) -> EngineResult<()> {
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
        let args: Vec<Term> = self
            .frame
            .operands
            .drain(split..)
            .map(|t| interp.store.deref(&t).clone())
            .collect();
        let compound = Compound::new(tag.name, args)?;
        self.frame.operands.push(Term::Compound(Arc::new(compound)));
        Ok(())
    }
}
