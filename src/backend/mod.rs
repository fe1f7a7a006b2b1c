// Backend of the logic-programming engine
//
// - `models`, `symbol`, `store`: terms, atoms, variable cells and the trail
// - `unify`, `order`, `copy`: operations over terms bound through a store
// - `predicate`, `registry`, `database`: the calling convention and where
//   predicates come from
// - `bytecode`: clause compiler and VM
// - `interpreter`, `engine`: per-thread execution context and shared state

pub mod builtins;
pub mod bytecode;
pub mod copy;
pub mod database;
pub mod engine;
pub mod errors;
pub mod flags;
pub mod interpreter;
pub mod models;
pub mod order;
pub mod predicate;
pub mod redefinition;
pub mod registry;
pub mod store;
pub mod symbol;
pub mod unify;

pub use database::{ClausePosition, Database};
pub use engine::Engine;
pub use errors::{EngineError, EngineResult, ErrorKind};
pub use flags::Flags;
pub use interpreter::{Checkpoint, Interpreter};
pub use models::*;
pub use predicate::{
    ChoicePoint, ChoiceRecord, ChoiceStack, DetFn, Deterministic, ExecResult, Predicate,
    PredicateResult,
};
pub use registry::PredicateRegistry;
pub use store::{Store, Trail, TrailMark};
pub use symbol::{atoms, intern, intern_string, Atom};
