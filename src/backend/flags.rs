//! Per-context engine flags (`current_prolog_flag/2`, `set_prolog_flag/2`).

use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::models::Term;
use crate::backend::symbol::{atoms, Atom};
use crate::config::{EngineConfig, UnknownPolicy};

#[derive(Debug, Clone)]
pub struct Flags {
    pub occurs_check: bool,
    pub unknown: UnknownPolicy,
    pub prefer_rationals: bool,
    pub max_arity: usize,
    pub max_call_depth: usize,
}

/// Flag names in the order `current_prolog_flag/2` enumerates them
pub const FLAG_NAMES: &[&str] = &[
    "bounded",
    "max_integer",
    "min_integer",
    "max_arity",
    "max_call_depth",
    "occurs_check",
    "unknown",
    "prefer_rationals",
];

impl Flags {
    pub fn from_config(config: &EngineConfig) -> Self {
        Flags {
            occurs_check: config.occurs_check,
            unknown: config.unknown,
            prefer_rationals: config.prefer_rationals,
            max_arity: config.max_arity,
            max_call_depth: config.max_call_depth,
        }
    }

    /// Current value of flag `name`, or `None` if there is no such flag
    pub fn get(&self, name: Atom) -> Option<Term> {
        let bool_atom = |b: bool| Term::Atom(if b { atoms().true_ } else { atoms().false_ });
        let value = match name.as_str() {
            "bounded" => bool_atom(false),
            "max_integer" => Term::Integer(i64::MAX),
            "min_integer" => Term::Integer(i64::MIN),
            "max_arity" => Term::Integer(self.max_arity as i64),
            "max_call_depth" => Term::Integer(self.max_call_depth as i64),
            "occurs_check" => bool_atom(self.occurs_check),
            "unknown" => Term::atom(self.unknown.as_str()),
            "prefer_rationals" => bool_atom(self.prefer_rationals),
            _ => return None,
        };
        Some(value)
    }

    /// Set flag `name` to an already dereferenced `value`.
    pub fn set(&mut self, name: Atom, value: &Term) -> EngineResult<()> {
        let bad_value = || EngineError::domain_error("flag_value", Term::app("+", vec![Term::Atom(name), value.clone()]));
        match name.as_str() {
            "occurs_check" => self.occurs_check = parse_bool(value).ok_or_else(bad_value)?,
            "prefer_rationals" => self.prefer_rationals = parse_bool(value).ok_or_else(bad_value)?,
            "unknown" => {
                self.unknown = match value.as_atom().map(|a| a.as_str()) {
                    Some("error") => UnknownPolicy::Error,
                    Some("fail") => UnknownPolicy::Fail,
                    _ => return Err(bad_value()),
                }
            }
            "max_call_depth" => match value {
                Term::Integer(n) if *n > 0 => self.max_call_depth = *n as usize,
                _ => return Err(bad_value()),
            },
            "bounded" | "max_integer" | "min_integer" | "max_arity" => {
                return Err(EngineError::permission_error("modify", "flag", Term::Atom(name)))
            }
            _ => return Err(EngineError::domain_error("prolog_flag", Term::Atom(name))),
        }
        Ok(())
    }
}

fn parse_bool(value: &Term) -> Option<bool> {
    match value.as_atom()?.as_str() {
        "true" | "on" => Some(true),
        "false" | "off" => Some(false),
        _ => None,
    }
}
