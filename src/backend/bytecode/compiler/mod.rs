//! Clause compiler
//!
//! Compiles the clauses of one predicate into a single [`Chunk`], one entry
//! point per clause. Each clause body has the shape
//!
//! ```text
//! allocate N                 ; N fresh variables for the clause
//! bind_arg / unify_arg ...   ; head arguments
//! <body goals>
//! proceed
//! ```
//!
//! Clause selection is not compiled: the VM picks candidate clauses with
//! first-argument indexing and jumps to their entry points. Body control
//! constructs are compiled inline (see `control_flow`).

mod control_flow;


use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::chunk::{Chunk, ChunkBuilder};
use super::opcodes::Opcode;
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::models::{ClauseTemplate, Tag, Term, VarId};
use crate::backend::symbol::{intern, Atom};

/// First-argument index key of a clause head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKey {
    Atom(Atom),
    Integer(i64),
    Functor(Tag),
}

impl IndexKey {
    /// Key of an already dereferenced first argument. Variables and numbers
    /// without a cheap key give `None`, which matches every clause.
    pub fn of(term: &Term) -> Option<IndexKey> {
        match term {
            Term::Atom(a) => Some(IndexKey::Atom(*a)),
            Term::Integer(i) => Some(IndexKey::Integer(*i)),
            Term::Compound(c) => Some(IndexKey::Functor(c.tag())),
            _ => None,
        }
    }
}

/// Entry point of one clause in the predicate chunk
#[derive(Debug, Clone)]
pub struct ClauseEntry {
    pub entry: usize,
    pub key: Option<IndexKey>,
}

/// Code and clause table of a compiled predicate. Activations hold it
/// through `Arc`, so a redefinition never disturbs a running call.
#[derive(Debug)]
pub struct PredicateCode {
    tag: Tag,
    chunk: Chunk,
    clauses: Vec<ClauseEntry>,
}

impl PredicateCode {
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    #[inline]
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    #[inline]
    pub fn clause(&self, index: usize) -> Option<&ClauseEntry> {
        self.clauses.get(index)
    }

    /// Clauses that may match a call whose dereferenced first argument is
    /// `first_arg`, in clause order.
    pub fn candidates(&self, first_arg: Option<&Term>) -> Vec<usize> {
        let key = first_arg.and_then(IndexKey::of);
        self.clauses
            .iter()
            .enumerate()
            .filter(|(_, clause)| match (&key, &clause.key) {
                (Some(call_key), Some(clause_key)) => call_key == clause_key,
                _ => true,
            })
            .map(|(i, _)| i)
            .collect()
    }
}

/// A predicate defined by clauses, executed by the VM
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    code: Arc<PredicateCode>,
}

impl CompiledPredicate {
    #[inline]
    pub fn tag(&self) -> Tag {
        self.code.tag
    }

    #[inline]
    pub fn code(&self) -> &Arc<PredicateCode> {
        &self.code
    }

    #[inline]
    pub fn chunk(&self) -> &Chunk {
        &self.code.chunk
    }

    #[inline]
    pub fn clause_count(&self) -> usize {
        self.code.clauses.len()
    }

    pub fn candidates(&self, first_arg: Option<&Term>) -> Vec<usize> {
        self.code.candidates(first_arg)
    }
}

/// Compile the clauses of `tag`.
pub fn compile_predicate(
    tag: Tag,
    clauses: &[Arc<ClauseTemplate>],
    max_arity: usize,
) -> EngineResult<CompiledPredicate> {
    if tag.arity as usize > max_arity || tag.arity > u16::MAX as u32 {
        return Err(EngineError::representation_error("max_arity"));
    }
    let mut builder = ChunkBuilder::new(tag.to_string());
    let mut entries = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let entry = builder.current_offset();
        let key = clause
            .head()
            .args()
            .first()
            .and_then(IndexKey::of);
        ClauseCompiler::new(&mut builder, clause.var_count())?.compile(clause)?;
        entries.push(ClauseEntry { entry, key });
    }
    let chunk = builder.build();
    trace!(target: "prologtron::compiler", %tag, code_len = chunk.len(), "compiled predicate");
    Ok(CompiledPredicate {
        code: Arc::new(PredicateCode {
            tag,
            chunk,
            clauses: entries,
        }),
    })
}

/// Compile a detached goal whose variables are numbered `0..var_count` into
/// a single-clause predicate `'$call'(V0, ..., Vn) :- Goal`.
pub fn compile_goal(goal: &Term, var_count: u32) -> EngineResult<CompiledPredicate> {
    let head_args: Vec<Term> = (0..var_count).map(|i| Term::Var(VarId(i))).collect();
    let head = Term::app_atom(intern("$call"), head_args);
    let template = ClauseTemplate::new(Term::app(":-", vec![head, goal.clone()]))?;
    compile_predicate(template.tag(), &[Arc::new(template)], usize::MAX)
}

/// Compiles one clause into the shared builder
pub(super) struct ClauseCompiler<'b> {
    builder: &'b mut ChunkBuilder,
    var_count: u16,
}

enum Emit<'t> {
    Visit(&'t Term),
    Build(Tag),
}

impl<'b> ClauseCompiler<'b> {
    fn new(builder: &'b mut ChunkBuilder, var_count: u32) -> EngineResult<Self> {
        let var_count = u16::try_from(var_count)
            .map_err(|_| EngineError::representation_error("clause_variables"))?;
        Ok(ClauseCompiler { builder, var_count })
    }

    fn compile(mut self, clause: &ClauseTemplate) -> EngineResult<()> {
        self.builder.emit_u16(Opcode::Allocate, self.var_count);
        let mut seen = vec![false; self.var_count as usize];
        for (index, arg) in clause.head().args().iter().enumerate() {
            let arg_index = index as u16;
            match arg {
                Term::Var(id) if !seen[id.index()] => {
                    seen[id.index()] = true;
                    self.builder.emit_bind_arg(id.0 as u16, arg_index);
                }
                _ => {
                    mark_seen(arg, &mut seen);
                    self.emit_term(arg);
                    self.builder.emit_u16(Opcode::UnifyArg, arg_index);
                }
            }
        }
        self.compile_body(clause.body(), control_flow::CutTarget::Activation)?;
        self.builder.emit(Opcode::Proceed);
        Ok(())
    }

    /// Emit code leaving `term` on the operand stack. Ground subterms become
    /// pool constants; the rest is built with `create_compound`.
    fn emit_term(&mut self, term: &Term) {
        let ground = ground_compounds(term);
        let mut work = vec![Emit::Visit(term)];
        while let Some(item) = work.pop() {
            match item {
                Emit::Visit(t) => match t {
                    Term::Var(id) => self.builder.emit_u16(Opcode::PushEnv, id.0 as u16),
                    Term::Compound(c) => {
                        if ground.get(&compound_key(t)).copied().unwrap_or(false) {
                            self.builder.emit_constant(t.clone());
                        } else {
                            work.push(Emit::Build(c.tag()));
                            work.extend(c.args().iter().rev().map(Emit::Visit));
                        }
                    }
                    atomic => self.builder.emit_constant(atomic.clone()),
                },
                Emit::Build(tag) => self.builder.emit_create_compound(tag),
            }
        }
    }
}

fn mark_seen(term: &Term, seen: &mut [bool]) {
    let mut work = vec![term];
    while let Some(t) = work.pop() {
        match t {
            Term::Var(id) => seen[id.index()] = true,
            Term::Compound(c) => work.extend(c.args().iter()),
            _ => {}
        }
    }
}

fn compound_key(term: &Term) -> usize {
    match term {
        Term::Compound(c) => Arc::as_ptr(c) as usize,
        _ => 0,
    }
}

/// Groundness of every compound cell reachable from `term`, keyed by cell
/// address, computed in one post-order pass.
fn ground_compounds(term: &Term) -> HashMap<usize, bool> {
    let mut ground: HashMap<usize, bool> = HashMap::new();
    let mut work: Vec<(&Term, bool)> = vec![(term, false)];
    while let Some((t, expanded)) = work.pop() {
        let Term::Compound(c) = t else { continue };
        let key = compound_key(t);
        if ground.contains_key(&key) {
            continue;
        }
        if expanded {
            let all_ground = c.args().iter().all(|arg| match arg {
                Term::Var(_) => false,
                Term::Compound(_) => ground.get(&compound_key(arg)).copied().unwrap_or(false),
                _ => true,
            });
            ground.insert(key, all_ground);
        } else {
            work.push((t, true));
            work.extend(c.args().iter().map(|arg| (arg, false)));
        }
    }
    ground
}
