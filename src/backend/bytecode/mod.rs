//! Clause bytecode
//!
//! Predicates defined by clauses are compiled into a [`Chunk`] of bytecode
//! and executed by the clause VM under the choice-point protocol.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    Database (clause templates)                    │
//! └───────────────────────────────────────────────────────────────────┘
//!                                 │
//!                                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    Clause Compiler                                │
//! │        clauses of Name/Arity → Chunk + clause table               │
//! └───────────────────────────────────────────────────────────────────┘
//!                                 │
//!                                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    Clause VM                                      │
//! │                                                                   │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐                │
//! │  │ Environment │  │ Operand     │  │ Cut         │                │
//! │  │ (clause     │  │ Stack       │  │ Registers   │                │
//! │  │  variables) │  │             │  │             │                │
//! │  └─────────────┘  └─────────────┘  └─────────────┘                │
//! │                                                                   │
//! │  shared with every predicate of the context:                      │
//! │  ┌─────────────┐  ┌─────────────┐                                 │
//! │  │ Store +     │  │ Choice      │                                 │
//! │  │ Trail       │  │ Stack       │                                 │
//! │  └─────────────┘  └─────────────┘                                 │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`opcodes`]: instruction set
//! - [`chunk`]: code buffer with constant and tag pools
//! - [`compiler`]: clause and goal compilation, first-argument index
//! - [`vm`]: activations, backtracking and cut

pub mod chunk;
pub mod compiler;
pub mod opcodes;
pub mod vm;

pub use chunk::{Chunk, ChunkBuilder, JumpLabel};
pub use compiler::{compile_goal, compile_predicate, CompiledPredicate, IndexKey, PredicateCode};
pub use opcodes::Opcode;
pub use vm::{call_compiled, resume_compiled, Step};
