//! Execution context.
//!
//! An [`Interpreter`] owns everything one thread of execution mutates: the
//! variable store, the trail, the choice stack, the flags, and the caches it
//! dispatches through. The clause database and predicate registry are shared
//! with every other context of the same [`Engine`].
//!
//! ```ignore
//! let engine = Engine::new();
//! let mut interp = engine.interpreter();
//! let x = interp.fresh_var().unwrap();
//! let goal = Term::app("member", vec![x.clone(), list_from_vec(items)]);
//! let mut result = interp.solve(&goal)?;
//! while result.succeeded() {
//!     println!("{}", interp.resolve(&x));
//!     result = match result {
//!         PredicateResult::Success => interp.next_solution()?,
//!         _ => break,
//!     };
//! }
//! ```

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::backend::builtins::solutions;
use crate::backend::bytecode::compiler::{compile_goal, CompiledPredicate};
use crate::backend::bytecode::vm::{call_compiled, resume_compiled};
use crate::backend::copy;
use crate::backend::engine::Engine;
use crate::backend::errors::{EngineError, EngineResult, ErrorKind};
use crate::backend::flags::Flags;
use crate::backend::models::template::detach_with_vars;
use crate::backend::models::{Tag, Term};
use crate::backend::predicate::{ChoiceRecord, ChoiceStack, ExecResult, Predicate, PredicateResult};
use crate::backend::redefinition::RedefinitionListener;
use crate::backend::store::{Store, Trail, TrailMark};
use crate::backend::unify::unify_terms;
use crate::config::UnknownPolicy;

/// Choice stack height, trail mark and store length taken before a nested
/// execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub height: usize,
    pub mark: TrailMark,
    pub cells: usize,
}

/// Tags whose cached dispatch entry went stale. Filled from whichever thread
/// changed the definition, drained by the owning context before it resolves.
#[derive(Default)]
struct StaleTags {
    tags: Mutex<Vec<Tag>>,
    dirty: AtomicBool,
}

impl RedefinitionListener for StaleTags {
    fn predicate_changed(&self, tag: Tag) {
        self.tags.lock().push(tag);
        self.dirty.store(true, Ordering::Release);
    }
}

/// Fails every call; dispatched for unknown procedures under `unknown = fail`.
#[derive(Debug)]
struct UndefinedProcedure;

impl Predicate for UndefinedProcedure {
    fn execute(&self, _interp: &mut Interpreter, _backtrack: bool, _args: &[Term]) -> ExecResult {
        Ok(PredicateResult::Fail)
    }
}

pub struct Interpreter {
    pub(crate) store: Store,
    pub(crate) trail: Trail,
    pub(crate) choices: ChoiceStack,
    flags: Flags,
    engine: Engine,

    /// Resolved predicate per tag, dropped on redefinition
    dispatch: HashMap<Tag, Arc<dyn Predicate>>,
    stale: Arc<StaleTags>,
    listener: Arc<dyn RedefinitionListener>,
    subscribed: HashSet<Tag>,

    /// Compiled meta-call goals keyed by their detached form
    goals: LruCache<Term, CompiledPredicate>,

    depth: usize,
    cancel: Arc<AtomicBool>,
    trace: bool,
    query: Option<Checkpoint>,
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("variables", &self.store.len())
            .field("trail", &self.trail.len())
            .field("choices", &self.choices.height())
            .field("cached_predicates", &self.dispatch.len())
            .field("depth", &self.depth)
            .finish()
    }
}

impl Interpreter {
    pub fn new(engine: Engine) -> Self {
        let config = engine.config();
        let flags = Flags::from_config(config);
        let cache_size = NonZeroUsize::new(config.goal_cache_size).unwrap_or(NonZeroUsize::MIN);
        let trace = config.trace;
        let stale = Arc::new(StaleTags::default());
        let listener: Arc<dyn RedefinitionListener> = stale.clone();
        Interpreter {
            store: Store::with_capacity(1024),
            trail: Trail::new(),
            choices: ChoiceStack::new(),
            flags,
            engine,
            dispatch: HashMap::new(),
            stale,
            listener,
            subscribed: HashSet::new(),
            goals: LruCache::new(cache_size),
            depth: 0,
            cancel: Arc::new(AtomicBool::new(false)),
            trace,
            query: None,
        }
    }

    #[inline]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    #[inline]
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    #[inline]
    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    #[inline]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn choice_height(&self) -> usize {
        self.choices.height()
    }

    #[inline]
    pub(crate) fn tracing(&self) -> bool {
        self.trace
    }

    // ---------------------------------------------------------------------
    // Terms and bindings
    // ---------------------------------------------------------------------

    pub fn fresh_var(&mut self) -> EngineResult<Term> {
        self.store.fresh_var()
    }

    /// Dereferenced copy of `term`
    #[inline]
    pub fn deref(&self, term: &Term) -> Term {
        self.store.deref(term).clone()
    }

    /// `term` with every bound variable replaced by its value
    pub fn resolve(&self, term: &Term) -> Term {
        copy::resolve(&self.store, term)
    }

    /// Unify under the current `occurs_check` flag. On failure some bindings
    /// may remain; callers undo to a mark they took.
    pub fn unify(&mut self, a: &Term, b: &Term) -> bool {
        unify_terms(&mut self.store, &mut self.trail, a, b, self.flags.occurs_check)
    }

    /// Unify, undoing any partial bindings on failure.
    pub fn unify_or_undo(&mut self, a: &Term, b: &Term) -> bool {
        let mark = self.trail.mark();
        if self.unify(a, b) {
            true
        } else {
            self.trail.undo_to(mark, &mut self.store);
            false
        }
    }

    #[inline]
    pub fn mark(&self) -> TrailMark {
        self.trail.mark()
    }

    #[inline]
    pub fn undo_to(&mut self, mark: TrailMark) {
        self.trail.undo_to(mark, &mut self.store);
    }

    #[inline]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            height: self.choices.height(),
            mark: self.trail.mark(),
            cells: self.store.len(),
        }
    }

    /// Drop every choice record above the checkpoint, undo its bindings and
    /// release the cells allocated since. Terms built after the checkpoint
    /// must be detached first if they are still needed.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.choices.cut_to(checkpoint.height);
        self.trail.undo_to(checkpoint.mark, &mut self.store);
        self.store.truncate(checkpoint.cells);
    }

    /// Leave `record` for the running predicate to resume from. A predicate
    /// returning `Success` pushes exactly one; `mark` is the trail position
    /// undone before it is resumed. The record may only hold terms that
    /// exist when it is pushed.
    pub fn push_choice<R: ChoiceRecord>(&mut self, mark: TrailMark, record: R) {
        let cells = self.store.len();
        self.choices.push(mark, cells, record);
    }

    /// In backtrack mode: pop the predicate's own record, undo the bindings
    /// made since it was pushed and release the cells allocated since.
    pub fn pop_choice<T: Any>(&mut self) -> EngineResult<T> {
        let (mark, cells, record) = self.choices.pop_as::<T>()?;
        self.trail.undo_to(mark, &mut self.store);
        self.store.truncate(cells);
        Ok(record)
    }

    // ---------------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------------

    /// The predicate `tag` dispatches to: a registered built-in, then a
    /// database procedure, then the `unknown` policy.
    pub fn resolve_predicate(&mut self, tag: Tag) -> EngineResult<Arc<dyn Predicate>> {
        self.drain_stale();
        if let Some(predicate) = self.dispatch.get(&tag) {
            return Ok(Arc::clone(predicate));
        }

        let predicate: Arc<dyn Predicate> = if let Some(builtin) = self.engine.registry().get(tag) {
            builtin
        } else if let Some(compiled) = self.engine.database().lookup(tag, self.flags.max_arity)? {
            compiled
        } else {
            match self.flags.unknown {
                UnknownPolicy::Error => return Err(EngineError::unknown_procedure(tag)),
                UnknownPolicy::Fail => Arc::new(UndefinedProcedure),
            }
        };

        if self.subscribed.insert(tag) {
            self.engine.hub().subscribe(tag, &self.listener);
        }
        trace!(target: "prologtron::interpreter", %tag, ?predicate, "resolved");
        predicate.install(self);
        self.dispatch.insert(tag, Arc::clone(&predicate));
        Ok(predicate)
    }

    fn drain_stale(&mut self) {
        if !self.stale.dirty.swap(false, Ordering::Acquire) {
            return;
        }
        let tags: Vec<Tag> = std::mem::take(&mut *self.stale.tags.lock());
        for tag in tags {
            if let Some(predicate) = self.dispatch.remove(&tag) {
                trace!(target: "prologtron::interpreter", %tag, "dispatch entry invalidated");
                predicate.uninstall(self);
            }
        }
    }

    /// Number of tags with a cached dispatch entry
    pub fn cached_predicates(&self) -> usize {
        self.dispatch.len()
    }

    // ---------------------------------------------------------------------
    // Limits
    // ---------------------------------------------------------------------

    pub(crate) fn enter_call(&mut self) -> EngineResult<()> {
        if self.depth >= self.flags.max_call_depth {
            debug!(target: "prologtron::interpreter", depth = self.depth, "call depth exceeded");
            return Err(EngineError::resource_error("call_depth"));
        }
        self.depth += 1;
        Ok(())
    }

    #[inline]
    pub(crate) fn leave_call(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub(crate) fn check_interrupt(&self) -> EngineResult<()> {
        if self.cancel.load(Ordering::Relaxed) {
            Err(EngineError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Shared flag that makes the running goal raise `Interrupted` at its next
    /// instruction. Cleared when the next query starts.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    // ---------------------------------------------------------------------
    // Meta-call
    // ---------------------------------------------------------------------

    /// Call `goal` under the choice-point protocol, as `call/1` does.
    pub fn call_goal(&mut self, goal: &Term) -> ExecResult {
        let (compiled, args) = self.prepare_goal(goal)?;
        call_compiled(compiled.code(), self, &args)
    }

    /// Resume a goal started with [`Interpreter::call_goal`] that returned
    /// `Success`; its record must be on top of the choice stack.
    pub fn redo_goal(&mut self) -> ExecResult {
        resume_compiled(self)
    }

    /// Compile `goal` into a `'$call'/N` predicate over its live variables.
    fn prepare_goal(&mut self, goal: &Term) -> EngineResult<(CompiledPredicate, Vec<Term>)> {
        let goal = self.deref(goal);
        if goal.is_var() {
            return Err(EngineError::instantiation());
        }
        if !goal.is_callable() {
            return Err(EngineError::type_error("callable", goal));
        }
        let (detached, vars) = detach_with_vars(&self.store, &goal);
        let args: Vec<Term> = vars.into_iter().map(Term::Var).collect();
        if let Some(compiled) = self.goals.get(&detached) {
            return Ok((compiled.clone(), args));
        }
        let compiled = compile_goal(&detached, args.len() as u32).map_err(|err| {
            if err.kind() == Some(ErrorKind::Type) {
                EngineError::type_error("callable", self.resolve(&goal))
            } else {
                err
            }
        })?;
        self.goals.put(detached, compiled.clone());
        Ok((compiled, args))
    }

    // ---------------------------------------------------------------------
    // Goal API
    // ---------------------------------------------------------------------

    /// Start a query for `goal`, abandoning any previous one. On `Success`,
    /// [`Interpreter::next_solution`] produces the next answer; bindings stay
    /// visible through [`Interpreter::resolve`] until the query is stopped.
    pub fn solve(&mut self, goal: &Term) -> ExecResult {
        self.abandon();
        self.cancel.store(false, Ordering::Relaxed);
        self.query = Some(self.checkpoint());
        debug!(target: "prologtron::interpreter", goal = %self.resolve(goal), "solve");
        let result = self.call_goal(goal);
        self.finish(result)
    }

    /// Backtrack into the current query for its next answer.
    pub fn next_solution(&mut self) -> ExecResult {
        let Some(query) = self.query else {
            return Ok(PredicateResult::Fail);
        };
        if self.choices.height() <= query.height {
            self.stop();
            return Ok(PredicateResult::Fail);
        }
        let result = self.redo_goal();
        self.finish(result)
    }

    fn finish(&mut self, result: ExecResult) -> ExecResult {
        match result {
            Ok(PredicateResult::Fail) => {
                self.stop();
                Ok(PredicateResult::Fail)
            }
            Ok(other) => Ok(other),
            Err(err) => {
                debug!(target: "prologtron::interpreter", error = %err, "query raised");
                self.stop();
                Err(err)
            }
        }
    }

    /// Abandon the current query, discarding its alternatives and bindings
    /// and releasing the cells it allocated. Variables the host created
    /// while the query was open go with them.
    pub fn stop(&mut self) {
        if let Some(query) = self.query.take() {
            self.rollback(query);
        }
    }

    /// Like [`Interpreter::stop`], keeping the cells: the next goal may
    /// refer to variables created after the abandoned query started.
    fn abandon(&mut self) {
        if let Some(query) = self.query.take() {
            self.choices.cut_to(query.height);
            self.trail.undo_to(query.mark, &mut self.store);
        }
    }

    /// Every answer of `goal` as a resolved copy of `template`.
    pub fn find_all(&mut self, template: &Term, goal: &Term) -> EngineResult<Vec<Term>> {
        self.cancel.store(false, Ordering::Relaxed);
        let answers = solutions::collect_all(self, template, goal)?;
        Ok(answers.iter().map(|t| self.resolve(t)).collect())
    }

    /// Stop the current query and release every variable cell. Terms built
    /// against this context before the reset must not be used afterwards.
    pub fn reset(&mut self) {
        self.stop();
        self.choices.cut_to(0);
        self.trail.clear();
        self.store.clear();
        self.depth = 0;
    }
}
