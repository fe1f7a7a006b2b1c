//! Core types of the clause VM.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::backend::bytecode::compiler::PredicateCode;
use crate::backend::models::{Tag, Term};
use crate::backend::predicate::{ChoicePoint, Predicate};
use crate::backend::store::TrailMark;

/// Driver loop state produced by every instruction and every resumption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Continue at the program counter, already advanced past the instruction
    Next,
    /// Continue at an absolute offset
    Jump(usize),
    /// Resume the most recent choice record of this activation
    Backtrack,
    /// The clause body finished
    Return,
}

/// Registers of a clause activation that choice records snapshot.
///
/// Environment slots hold terms whose variables live in the store, so
/// restoring a snapshot plus undoing the trail restores the activation.
#[derive(Debug, Clone, Default)]
pub(crate) struct Frame {
    /// Clause variables, indexed by slot
    pub env: Vec<Term>,
    /// Push-down stack of terms under construction
    pub operands: Vec<Term>,
    /// Choice stack heights saved by `mark_choice`
    pub registers: SmallVec<[usize; 4]>,
}

/// Choice records pushed inside a clause activation.
#[derive(Debug)]
pub(crate) enum FrameChoice {
    /// Remaining candidate clauses of the predicate being entered
    Clauses {
        code: Arc<PredicateCode>,
        args: Arc<[Term]>,
        candidates: Arc<[usize]>,
        next: usize,
    },
    /// The other branch of a `try_me_else`
    Alternative {
        code: Arc<PredicateCode>,
        pc: usize,
        frame: Frame,
    },
    /// A body call that left alternatives. `pc` is the continuation.
    Call {
        code: Arc<PredicateCode>,
        pc: usize,
        tag: Tag,
        predicate: Arc<dyn Predicate>,
        args: Arc<[Term]>,
        frame: Frame,
    },
}

/// The single record a compiled predicate leaves when it succeeds with
/// alternatives: every record its activation pushed, set aside in order.
#[derive(Debug)]
pub(crate) struct ActivationChoice {
    pub tag: Tag,
    pub entry_mark: TrailMark,
    pub inner: Vec<ChoicePoint>,
}
