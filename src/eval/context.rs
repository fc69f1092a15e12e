use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Variable bindings for a single evaluation.
///
/// The context is read-only while an expression is evaluated; the evaluator
/// only borrows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationContext {
    variables: HashMap<String, Value>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.variables.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for EvaluationContext {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            variables: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, Value>> for EvaluationContext {
    fn from(variables: HashMap<String, Value>) -> Self {
        Self { variables }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookup() {
        let ctx = EvaluationContext::new()
            .with("pressure", 612.0)
            .with("t", vec![50.0, 51.0]);
        assert_eq!(ctx.get("pressure"), Some(&Value::Scalar(612.0)));
        assert_eq!(ctx.get("t"), Some(&Value::Sequence(vec![50.0, 51.0])));
        assert!(ctx.get("missing").is_none());
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_from_json_document() {
        let ctx: EvaluationContext =
            serde_json::from_str(r#"{"p": {"Scalar": 400.0}, "ok": {"Boolean": true}}"#).unwrap();
        assert_eq!(ctx.get("p"), Some(&Value::Scalar(400.0)));
        assert_eq!(ctx.get("ok"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_collect() {
        let ctx: EvaluationContext = [("a", 1.0), ("b", 2.0)].into_iter().collect();
        assert!(ctx.contains("a"));
        assert!(ctx.contains("b"));
    }
}
