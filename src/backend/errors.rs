//! Engine error type.
//!
//! Program-level exceptions travel as [`EngineError::Thrown`] carrying the
//! ball term; `catch/3` only ever intercepts that variant. `Halt` and
//! `Interrupted` unwind through every handler to the host.

use thiserror::Error;

use crate::backend::models::{Tag, Term};
use crate::backend::symbol::{atoms, intern_string};

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// An exception raised by `throw/1` or by the engine on a program error.
    /// The ball is fully resolved; any variables left in it are unbound
    /// cells of the raising execution context.
    #[error("unhandled exception: {0}")]
    Thrown(Term),

    /// `halt/0,1`
    #[error("halt({0})")]
    Halt(i32),

    /// The execution context was cancelled from another thread
    #[error("execution interrupted")]
    Interrupted,
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Classification of ISO error terms `error(Formal, Context)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Instantiation,
    Type,
    Domain,
    Existence,
    Permission,
    Representation,
    Evaluation,
    Resource,
    Syntax,
    System,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Instantiation => "instantiation_error",
            ErrorKind::Type => "type_error",
            ErrorKind::Domain => "domain_error",
            ErrorKind::Existence => "existence_error",
            ErrorKind::Permission => "permission_error",
            ErrorKind::Representation => "representation_error",
            ErrorKind::Evaluation => "evaluation_error",
            ErrorKind::Resource => "resource_error",
            ErrorKind::Syntax => "syntax_error",
            ErrorKind::System => "system_error",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "instantiation_error" => ErrorKind::Instantiation,
            "type_error" => ErrorKind::Type,
            "domain_error" => ErrorKind::Domain,
            "existence_error" => ErrorKind::Existence,
            "permission_error" => ErrorKind::Permission,
            "representation_error" => ErrorKind::Representation,
            "evaluation_error" => ErrorKind::Evaluation,
            "resource_error" => ErrorKind::Resource,
            "syntax_error" => ErrorKind::Syntax,
            "system_error" => ErrorKind::System,
            _ => return None,
        })
    }
}

fn iso(formal: Term) -> EngineError {
    EngineError::Thrown(Term::app_atom(atoms().error, vec![formal, Term::nil()]))
}

impl EngineError {
    pub fn instantiation() -> Self {
        iso(Term::atom("instantiation_error"))
    }

    pub fn type_error(expected: &str, culprit: Term) -> Self {
        iso(Term::app("type_error", vec![Term::atom(expected), culprit]))
    }

    pub fn domain_error(domain: &str, culprit: Term) -> Self {
        iso(Term::app("domain_error", vec![Term::atom(domain), culprit]))
    }

    pub fn existence_error(kind: &str, culprit: Term) -> Self {
        iso(Term::app("existence_error", vec![Term::atom(kind), culprit]))
    }

    pub fn unknown_procedure(tag: Tag) -> Self {
        Self::existence_error("procedure", tag.indicator()).in_predicate(tag)
    }

    pub fn permission_error(action: &str, kind: &str, culprit: Term) -> Self {
        iso(Term::app(
            "permission_error",
            vec![Term::atom(action), Term::atom(kind), culprit],
        ))
    }

    pub fn representation_error(what: &str) -> Self {
        iso(Term::app("representation_error", vec![Term::atom(what)]))
    }

    pub fn evaluation_error(what: &str) -> Self {
        iso(Term::app("evaluation_error", vec![Term::atom(what)]))
    }

    pub fn resource_error(what: &str) -> Self {
        iso(Term::app("resource_error", vec![Term::atom(what)]))
    }

    /// Engine invariant violation surfaced to the program
    pub fn system_error(message: impl Into<String>) -> Self {
        iso(Term::app(
            "system_error",
            vec![Term::Atom(intern_string(message.into()))],
        ))
    }

    /// Fill in the context of an ISO error with the predicate that raised it.
    /// Already-contextualised errors and non-ISO balls are returned unchanged.
    pub fn in_predicate(self, tag: Tag) -> Self {
        match self {
            EngineError::Thrown(ball) => match iso_parts(&ball) {
                Some((formal, context)) if context.is_nil() => {
                    let context = Term::app("context", vec![tag.indicator(), Term::nil()]);
                    EngineError::Thrown(Term::app_atom(atoms().error, vec![formal.clone(), context]))
                }
                _ => EngineError::Thrown(ball),
            },
            other => other,
        }
    }

    /// The ball of a thrown exception
    pub fn ball(&self) -> Option<&Term> {
        match self {
            EngineError::Thrown(ball) => Some(ball),
            _ => None,
        }
    }

    /// Formal part of an `error(Formal, Context)` ball
    pub fn formal(&self) -> Option<&Term> {
        self.ball().and_then(|b| iso_parts(b)).map(|(formal, _)| formal)
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        let formal = self.formal()?;
        let name = match formal {
            Term::Atom(a) => *a,
            Term::Compound(c) => c.functor(),
            _ => return None,
        };
        ErrorKind::from_name(name.as_str())
    }

    pub fn kind_name(&self) -> Option<&'static str> {
        self.kind().map(ErrorKind::name)
    }

    /// Errors that `catch/3` may intercept
    #[inline]
    pub fn is_catchable(&self) -> bool {
        matches!(self, EngineError::Thrown(_))
    }
}

fn iso_parts(ball: &Term) -> Option<(&Term, &Term)> {
    match ball {
        Term::Compound(c) if c.arity() == 2 && c.functor() == atoms().error => {
            Some((&c.args()[0], &c.args()[1]))
        }
        _ => None,
    }
}

impl From<crate::backend::models::TermError> for EngineError {
    fn from(err: crate::backend::models::TermError) -> Self {
        match err {
            crate::backend::models::TermError::ZeroArity(name) => {
                EngineError::domain_error("compound_non_zero_arity", Term::Atom(name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_error_shape() {
        let err = EngineError::type_error("integer", Term::atom("foo"));
        assert_eq!(err.kind(), Some(ErrorKind::Type));
        assert_eq!(
            err.formal(),
            Some(&Term::app("type_error", vec![Term::atom("integer"), Term::atom("foo")]))
        );
        assert!(err.is_catchable());
    }

    #[test]
    fn test_context_filled_once() {
        let tag = Tag::of("succ", 2);
        let err = EngineError::instantiation().in_predicate(tag);
        let ball = err.ball().cloned().expect("ball");
        let context = ball.args()[1].clone();
        assert_eq!(context.callable_tag(), Some(Tag::of("context", 2)));
        let again = err.in_predicate(Tag::of("other", 1));
        assert_eq!(again.ball(), Some(&ball));
    }

    #[test]
    fn test_halt_and_interrupt_not_catchable() {
        assert!(!EngineError::Halt(0).is_catchable());
        assert!(!EngineError::Interrupted.is_catchable());
        assert_eq!(EngineError::Halt(3).to_string(), "halt(3)");
    }

    #[test]
    fn test_user_ball_has_no_kind() {
        let err = EngineError::Thrown(Term::atom("oops"));
        assert_eq!(err.kind(), None);
        assert_eq!(err.to_string(), "unhandled exception: oops");
    }
}
