//! The predicate protocol and the choice stack.
//!
//! Every executable predicate, built-in or compiled, implements
//! [`Predicate`]. A call runs in one of two modes:
//!
//! - first call (`backtrack == false`): attempt the first solution
//! - backtrack (`backtrack == true`): the predicate's own record is on top of
//!   the choice stack; pop it, undo to its mark, and try the next alternative
//!
//! The predicate answers [`PredicateResult::Fail`], `Success` (more solutions
//! may exist; exactly one record of its own has been pushed) or
//! `SuccessLast` (no record left behind).

use std::any::Any;
use std::fmt;

use crate::backend::bytecode::compiler::CompiledPredicate;
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::Term;
use crate::backend::store::TrailMark;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateResult {
    Fail,
    Success,
    SuccessLast,
}

impl PredicateResult {
    #[inline]
    pub fn succeeded(self) -> bool {
        !matches!(self, PredicateResult::Fail)
    }

    /// Map a boolean outcome of a deterministic step
    #[inline]
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            PredicateResult::SuccessLast
        } else {
            PredicateResult::Fail
        }
    }
}

pub type ExecResult = EngineResult<PredicateResult>;

/// An executable predicate.
///
/// `args` are the caller's argument terms; in backtrack mode they are not
/// meaningful and implementations read their saved state instead.
pub trait Predicate: Send + Sync + fmt::Debug {
    fn execute(&self, interp: &mut Interpreter, backtrack: bool, args: &[Term]) -> ExecResult;

    /// Called when an execution context starts dispatching to this predicate.
    fn install(&self, _interp: &mut Interpreter) {}

    /// Called when an execution context drops this predicate from its cache.
    fn uninstall(&self, _interp: &mut Interpreter) {}

    /// The compiled form, for predicates defined by clauses. The VM uses it
    /// to run a deterministic last call in the caller's activation.
    fn as_compiled(&self) -> Option<&CompiledPredicate> {
        None
    }
}

/// Signature of deterministic built-ins
pub type DetFn = fn(&mut Interpreter, &[Term]) -> EngineResult<bool>;

/// Adapter for built-ins that succeed at most once
pub struct Deterministic {
    name: &'static str,
    func: DetFn,
}

impl Deterministic {
    pub fn new(name: &'static str, func: DetFn) -> Self {
        Deterministic { name, func }
    }
}

impl fmt::Debug for Deterministic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deterministic({})", self.name)
    }
}

impl Predicate for Deterministic {
    fn execute(&self, interp: &mut Interpreter, backtrack: bool, args: &[Term]) -> ExecResult {
        if backtrack {
            return Err(EngineError::system_error(format!(
                "deterministic predicate {} resumed",
                self.name
            )));
        }
        (self.func)(interp, args).map(PredicateResult::from_bool)
    }
}

/// State saved by a predicate that left alternatives behind.
///
/// Any `'static + Debug` type qualifies; the owner recovers its concrete type
/// with [`ChoiceStack::pop_as`].
pub trait ChoiceRecord: Any + fmt::Debug {
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn record_name(&self) -> &'static str;
}

impl<T: Any + fmt::Debug> ChoiceRecord for T {
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn record_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A choice record plus the state to restore before resuming it: the trail
/// mark to undo to and the store length to release back to.
#[derive(Debug)]
pub struct ChoicePoint {
    pub mark: TrailMark,
    pub cells: usize,
    pub record: Box<dyn ChoiceRecord>,
}

/// LIFO stack of choice points
#[derive(Debug, Default)]
pub struct ChoiceStack {
    points: Vec<ChoicePoint>,
}

impl ChoiceStack {
    pub fn new() -> Self {
        ChoiceStack { points: Vec::new() }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Push `record`. `cells` is the store length when it was created; every
    /// term it holds must live below that.
    #[inline]
    pub fn push<R: ChoiceRecord>(&mut self, mark: TrailMark, cells: usize, record: R) {
        self.points.push(ChoicePoint {
            mark,
            cells,
            record: Box::new(record),
        });
    }

    #[inline]
    pub fn pop(&mut self) -> Option<ChoicePoint> {
        self.points.pop()
    }

    /// Name of the record on top, for diagnostics
    pub fn top_name(&self) -> Option<&'static str> {
        self.points.last().map(|p| (*p.record).record_name())
    }

    /// Pop the top record as a `T`. A missing or foreign record means the
    /// protocol was broken and is reported as a system error.
    pub fn pop_as<T: Any>(&mut self) -> EngineResult<(TrailMark, usize, T)> {
        let point = self
            .points
            .pop()
            .ok_or_else(|| EngineError::system_error("choice stack underflow"))?;
        let name = (*point.record).record_name();
        match point.record.into_any().downcast::<T>() {
            Ok(record) => Ok((point.mark, point.cells, *record)),
            Err(_) => Err(EngineError::system_error(format!(
                "choice record mismatch: expected {}, found {}",
                std::any::type_name::<T>(),
                name
            ))),
        }
    }

    /// Discard every record above `height` (cut).
    #[inline]
    pub fn cut_to(&mut self, height: usize) {
        self.points.truncate(height);
    }

    /// Remove and return the records above `height`, oldest first.
    pub fn take_above(&mut self, height: usize) -> Vec<ChoicePoint> {
        if height >= self.points.len() {
            return Vec::new();
        }
        self.points.split_off(height)
    }

    /// Push back records previously removed with [`ChoiceStack::take_above`].
    pub fn restore(&mut self, points: Vec<ChoicePoint>) {
        self.points.extend(points);
    }
}
