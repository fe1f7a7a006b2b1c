/// Prologtron - Logic-Programming Execution Engine
///
/// This library provides the execution core of a Prolog system: a term model
/// with destructive binding and a trail, unification, a bytecode compiler and
/// VM for clauses, chronological backtracking through a uniform choice-point
/// protocol, and a library of built-in predicates including the
/// all-solutions family.
///
/// # Architecture
///
/// 1. **Terms and bindings** (`backend::models`, `backend::store`)
///    - Atoms are interned; variables are cells of a per-context store
///    - Every binding is recorded on the trail so backtracking can undo it
///
/// 2. **Predicates** (`backend::predicate`, `backend::builtins`)
///    - Built-ins and compiled clauses share one calling convention: called
///      fresh or in backtrack mode, they answer fail, success, or last success
///    - Resumption state lives in typed choice records on a choice stack
///
/// 3. **Clauses** (`backend::database`, `backend::bytecode`)
///    - Clauses are compiled per predicate into bytecode with first-argument
///      indexing; the VM runs them under the same protocol
///
/// # Example
///
/// ```rust
/// use prologtron::backend::*;
///
/// let engine = Engine::new();
/// // likes(mary, wine). likes(john, mary).
/// engine.add_clause(Term::app("likes", vec![Term::atom("mary"), Term::atom("wine")])).unwrap();
/// engine.add_clause(Term::app("likes", vec![Term::atom("john"), Term::atom("mary")])).unwrap();
///
/// let mut interp = engine.interpreter();
/// let who = interp.fresh_var().unwrap();
/// let goal = Term::app("likes", vec![who.clone(), Term::atom("mary")]);
/// let answers = interp.find_all(&who, &goal).unwrap();
/// assert_eq!(answers, vec![Term::atom("john")]);
/// ```
///
/// # Engine Features
///
/// - **Control**: conjunction, disjunction, if-then-else, negation, cut, call/N
/// - **Exceptions**: catch/3 and throw/1 with ISO error terms
/// - **Arithmetic**: unbounded integers, rationals and floats
/// - **All-solutions**: findall/3,4, bagof/3, setof/3, aggregate_all/3
/// - **Database**: assert/retract on dynamic predicates with the logical
///   update view

pub mod backend;
pub mod config;
pub mod logging;

pub use backend::{
    EngineError, EngineResult, Engine, Interpreter, PredicateResult, Term, Tag,
};
pub use config::{ConfigError, EngineConfig, UnknownPolicy};
