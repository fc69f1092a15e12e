use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzer::ParseError;
use crate::operators::OperatorSpec;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse engine config: {0}")]
    Json(String),
    #[error("Operator '{operator}' has an invalid sample interval {interval}, must be positive")]
    InvalidInterval { operator: String, interval: f64 },
    #[error("Invalid expression '{expression}': {source}")]
    InvalidExpression {
        expression: String,
        source: ParseError,
    },
}

/// Engine construction settings.
///
/// ```
/// use kensa::config::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{
///     "operators": [{"kind": "rate_of_change", "name": "rate", "sample_interval": 1.0}],
///     "warm_expressions": ["max(rate(t)) < 5"]
/// }"#).unwrap();
/// assert!(config.builtins);
/// assert_eq!(config.operators.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub operators: Vec<OperatorSpec>,

    /// Seed the registry with the generic builtins.
    #[serde(default = "default_true")]
    pub builtins: bool,

    /// Parsed into the cache when the engine is built.
    #[serde(default)]
    pub warm_expressions: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            operators: Vec::new(),
            builtins: default_true(),
            warm_expressions: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::Json(e.to_string()))
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.builtins);
        assert!(config.operators.is_empty());
        assert!(config.warm_expressions.is_empty());
    }

    #[test]
    fn test_disable_builtins() {
        let config = EngineConfig::from_json(r#"{"builtins": false}"#).unwrap();
        assert!(!config.builtins);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json("{\"operators\": 3}"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_unknown_operator_kind() {
        let source = r#"{"operators": [{"kind": "fourier", "name": "f"}]}"#;
        let result = EngineConfig::from_json(source);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
