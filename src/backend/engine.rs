//! Engine: the state shared by every execution context.
//!
//! An [`Engine`] is a cheap handle (`Clone + Send + Sync`) over the predicate
//! registry, the clause database and the redefinition hub that connects them
//! to the dispatch caches of live contexts. Each thread creates its own
//! [`Interpreter`] with [`Engine::interpreter`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::builtins::library_clauses;
use crate::backend::database::{ClausePosition, Database};
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::{ClauseTemplate, Tag, Term};
use crate::backend::predicate::{DetFn, Predicate};
use crate::backend::redefinition::RedefinitionHub;
use crate::backend::registry::PredicateRegistry;
use crate::config::EngineConfig;

struct Shared {
    config: EngineConfig,
    hub: Arc<RedefinitionHub>,
    registry: PredicateRegistry,
    database: Database,
}

#[derive(Clone)]
pub struct Engine {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.shared.registry)
            .field("database", &self.shared.database)
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with the built-in predicates registered and the list
    /// library loaded.
    pub fn with_config(config: EngineConfig) -> Self {
        let hub = Arc::new(RedefinitionHub::new());
        let registry = PredicateRegistry::with_builtins(Arc::clone(&hub));
        let database = Database::new(Arc::clone(&hub));
        let mut loaded = 0usize;
        for clause in library_clauses() {
            match ClauseTemplate::new(clause) {
                Ok(template) => {
                    database.add_clause(template, ClausePosition::Last);
                    loaded += 1;
                }
                Err(err) => warn!(target: "prologtron::engine", error = %err, "invalid library clause"),
            }
        }
        info!(
            target: "prologtron::engine",
            builtins = registry.len(),
            library_clauses = loaded,
            "engine ready"
        );
        Engine {
            shared: Arc::new(Shared {
                config,
                hub,
                registry,
                database,
            }),
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    #[inline]
    pub fn registry(&self) -> &PredicateRegistry {
        &self.shared.registry
    }

    #[inline]
    pub fn database(&self) -> &Database {
        &self.shared.database
    }

    #[inline]
    pub fn hub(&self) -> &Arc<RedefinitionHub> {
        &self.shared.hub
    }

    /// A new execution context over this engine
    pub fn interpreter(&self) -> Interpreter {
        Interpreter::new(self.clone())
    }

    /// Register a host predicate. It takes precedence over clauses for `tag`.
    pub fn register(&self, tag: Tag, predicate: Arc<dyn Predicate>) {
        self.shared.registry.register(tag, predicate);
    }

    pub fn register_det(&self, name: &'static str, arity: u32, func: DetFn) {
        self.shared.registry.register_det(name, arity, func);
    }

    /// Append a program clause (`Head :- Body` or a fact). Its variables are
    /// `Term::Var` ids local to the clause.
    pub fn add_clause(&self, clause: Term) -> EngineResult<()> {
        self.add_template(ClauseTemplate::new(clause)?)
    }

    /// Load a sequence of clauses in order. Returns how many were added.
    pub fn consult<I>(&self, clauses: I) -> EngineResult<usize>
    where
        I: IntoIterator<Item = ClauseTemplate>,
    {
        let mut count = 0;
        for clause in clauses {
            self.add_template(clause)?;
            count += 1;
        }
        Ok(count)
    }

    fn add_template(&self, clause: ClauseTemplate) -> EngineResult<()> {
        let tag = clause.tag();
        if self.shared.registry.contains(tag) {
            return Err(EngineError::permission_error(
                "modify",
                "static_procedure",
                tag.indicator(),
            ));
        }
        self.shared.database.add_clause(clause, ClausePosition::Last);
        Ok(())
    }
}
