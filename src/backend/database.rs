//! Clause database shared by every execution context of an engine.
//!
//! Clauses are stored as detached [`ClauseTemplate`]s. Each procedure keeps a
//! lazily compiled form; any change to its clauses discards the compiled form
//! and publishes a redefinition, so the next dispatch recompiles. Running
//! activations keep the code they started with.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::backend::bytecode::compiler::{compile_predicate, CompiledPredicate};
use crate::backend::errors::EngineResult;
use crate::backend::models::{ClauseTemplate, Tag};
use crate::backend::redefinition::RedefinitionHub;

/// Where `add_clause` places a new clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClausePosition {
    First,
    Last,
}

#[derive(Debug, Default)]
struct Procedure {
    clauses: Vec<Arc<ClauseTemplate>>,
    dynamic: bool,
    compiled: Option<Arc<CompiledPredicate>>,
}

pub struct Database {
    procedures: RwLock<HashMap<Tag, Procedure>>,
    hub: Arc<RedefinitionHub>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("procedures", &self.procedures.read().len())
            .finish()
    }
}

impl Database {
    pub fn new(hub: Arc<RedefinitionHub>) -> Self {
        Database {
            procedures: RwLock::new(HashMap::new()),
            hub,
        }
    }

    pub fn add_clause(&self, clause: ClauseTemplate, position: ClausePosition) {
        let tag = clause.tag();
        {
            let mut procedures = self.procedures.write();
            let procedure = procedures.entry(tag).or_default();
            let clause = Arc::new(clause);
            match position {
                ClausePosition::First => procedure.clauses.insert(0, clause),
                ClausePosition::Last => procedure.clauses.push(clause),
            }
            procedure.compiled = None;
            trace!(target: "prologtron::database", %tag, clauses = procedure.clauses.len(), "clause added");
        }
        self.hub.publish(tag);
    }

    /// Mark `tag` dynamic, creating an empty procedure if needed.
    pub fn declare_dynamic(&self, tag: Tag) {
        let created = {
            let mut procedures = self.procedures.write();
            let existed = procedures.contains_key(&tag);
            procedures.entry(tag).or_default().dynamic = true;
            !existed
        };
        if created {
            self.hub.publish(tag);
        }
    }

    pub fn is_dynamic(&self, tag: Tag) -> bool {
        self.procedures
            .read()
            .get(&tag)
            .map(|p| p.dynamic)
            .unwrap_or(false)
    }

    /// Is a procedure (possibly empty) known for `tag`?
    pub fn is_defined(&self, tag: Tag) -> bool {
        self.procedures.read().contains_key(&tag)
    }

    /// Snapshot of the clauses for `tag`, in order
    pub fn clauses(&self, tag: Tag) -> Option<Vec<Arc<ClauseTemplate>>> {
        self.procedures.read().get(&tag).map(|p| p.clauses.clone())
    }

    /// Remove one specific clause (by identity). Returns whether it was found.
    pub fn remove_clause(&self, tag: Tag, clause: &Arc<ClauseTemplate>) -> bool {
        let removed = {
            let mut procedures = self.procedures.write();
            match procedures.get_mut(&tag) {
                Some(procedure) => {
                    let before = procedure.clauses.len();
                    procedure.clauses.retain(|c| !Arc::ptr_eq(c, clause));
                    let removed = procedure.clauses.len() != before;
                    if removed {
                        procedure.compiled = None;
                    }
                    removed
                }
                None => false,
            }
        };
        if removed {
            self.hub.publish(tag);
        }
        removed
    }

    /// Remove the procedure entirely.
    pub fn abolish(&self, tag: Tag) -> bool {
        let removed = self.procedures.write().remove(&tag).is_some();
        if removed {
            debug!(target: "prologtron::database", %tag, "procedure abolished");
            self.hub.publish(tag);
        }
        removed
    }

    /// Compiled form of `tag`, compiling on first use after a change.
    /// `Ok(None)` when no procedure exists.
    pub fn lookup(&self, tag: Tag, max_arity: usize) -> EngineResult<Option<Arc<CompiledPredicate>>> {
        {
            let procedures = self.procedures.read();
            match procedures.get(&tag) {
                None => return Ok(None),
                Some(Procedure {
                    compiled: Some(compiled),
                    ..
                }) => return Ok(Some(Arc::clone(compiled))),
                Some(_) => {}
            }
        }
        let mut procedures = self.procedures.write();
        let Some(procedure) = procedures.get_mut(&tag) else {
            return Ok(None);
        };
        if let Some(compiled) = &procedure.compiled {
            return Ok(Some(Arc::clone(compiled)));
        }
        let compiled = Arc::new(compile_predicate(tag, &procedure.clauses, max_arity)?);
        debug!(
            target: "prologtron::database",
            %tag,
            clauses = procedure.clauses.len(),
            code_len = compiled.chunk().len(),
            "procedure compiled"
        );
        procedure.compiled = Some(Arc::clone(&compiled));
        Ok(Some(compiled))
    }

    /// Every known procedure tag, sorted
    pub fn tags(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self.procedures.read().keys().copied().collect();
        tags.sort();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::{Term, VarId};

    fn fact(name: &str, arg: Term) -> ClauseTemplate {
        ClauseTemplate::new(Term::app(name, vec![arg])).expect("valid clause")
    }

    fn db() -> Database {
        Database::new(Arc::new(RedefinitionHub::new()))
    }

    #[test]
    fn test_clause_order_first_and_last() {
        let db = db();
        let tag = Tag::of("p", 1);
        db.add_clause(fact("p", Term::Integer(2)), ClausePosition::Last);
        db.add_clause(fact("p", Term::Integer(3)), ClausePosition::Last);
        db.add_clause(fact("p", Term::Integer(1)), ClausePosition::First);
        let heads: Vec<Term> = db
            .clauses(tag)
            .expect("defined")
            .iter()
            .map(|c| c.head().args()[0].clone())
            .collect();
        assert_eq!(heads, vec![Term::Integer(1), Term::Integer(2), Term::Integer(3)]);
    }

    #[test]
    fn test_compiled_form_cached_until_change() {
        let db = db();
        let tag = Tag::of("p", 1);
        db.add_clause(fact("p", Term::Var(VarId(0))), ClausePosition::Last);
        let first = db.lookup(tag, 255).expect("compiles").expect("defined");
        let again = db.lookup(tag, 255).expect("compiles").expect("defined");
        assert!(Arc::ptr_eq(&first, &again));

        db.add_clause(fact("p", Term::atom("a")), ClausePosition::Last);
        let recompiled = db.lookup(tag, 255).expect("compiles").expect("defined");
        assert!(!Arc::ptr_eq(&first, &recompiled));
        assert_eq!(recompiled.clause_count(), 2);
    }

    #[test]
    fn test_remove_and_abolish() {
        let db = db();
        let tag = Tag::of("q", 1);
        db.add_clause(fact("q", Term::atom("a")), ClausePosition::Last);
        let clauses = db.clauses(tag).expect("defined");
        assert!(db.remove_clause(tag, &clauses[0]));
        assert!(!db.remove_clause(tag, &clauses[0]));
        assert!(db.is_defined(tag));
        assert!(db.abolish(tag));
        assert!(db.lookup(tag, 255).expect("no error").is_none());
    }

    #[test]
    fn test_dynamic_declaration_creates_empty_procedure() {
        let db = db();
        let tag = Tag::of("counter", 1);
        db.declare_dynamic(tag);
        assert!(db.is_dynamic(tag));
        let compiled = db.lookup(tag, 255).expect("compiles").expect("defined");
        assert_eq!(compiled.clause_count(), 0);
    }
}
