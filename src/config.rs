//! Engine configuration.
//!
//! Every field has a default, so a TOML file only needs to name the values it
//! changes:
//!
//! ```toml
//! max_call_depth = 4096
//! occurs_check = true
//! unknown = "fail"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do when a goal names a procedure with no definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    /// Raise `existence_error(procedure, Name/Arity)`
    Error,
    /// Fail silently
    Fail,
}

impl UnknownPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            UnknownPolicy::Error => "error",
            UnknownPolicy::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum nesting of predicate activations before `resource_error(call_depth)`
    pub max_call_depth: usize,
    /// Largest arity accepted for compound terms and predicates
    pub max_arity: usize,
    /// Initial value of the `occurs_check` flag
    pub occurs_check: bool,
    /// Initial value of the `unknown` flag
    pub unknown: UnknownPolicy,
    /// Initial value of the `prefer_rationals` flag: `/` on integers yields an
    /// exact rational instead of a float
    pub prefer_rationals: bool,
    /// Compiled goals cached per execution context
    pub goal_cache_size: usize,
    /// Emit a trace event for every executed instruction
    pub trace: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_call_depth: 1000,
            max_arity: 255,
            occurs_check: false,
            unknown: UnknownPolicy::Error,
            prefer_rationals: false,
            goal_cache_size: 256,
            trace: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid engine config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid engine config: {0}")]
    Invalid(String),
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> String {
        // Plain scalars only, serialization cannot fail.
        toml::to_string(self).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid("max_call_depth must be positive".into()));
        }
        if self.max_arity == 0 {
            return Err(ConfigError::Invalid("max_arity must be positive".into()));
        }
        if self.goal_cache_size == 0 {
            return Err(ConfigError::Invalid("goal_cache_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("occurs_check = true\nunknown = \"fail\"\n")
            .expect("valid config");
        assert!(config.occurs_check);
        assert_eq!(config.unknown, UnknownPolicy::Fail);
        assert_eq!(config.max_call_depth, EngineConfig::default().max_call_depth);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = EngineConfig {
            max_call_depth: 99,
            prefer_rationals: true,
            ..EngineConfig::default()
        };
        let text = config.to_toml_string();
        assert_eq!(EngineConfig::from_toml_str(&text).expect("valid"), config);
    }

    #[test]
    fn test_rejects_zero_limits() {
        assert!(matches!(
            EngineConfig::from_toml_str("max_call_depth = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("unknown = \"maybe\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
