//! Runtime values produced and consumed by the evaluator.
//!
//! Every intermediate and final result is one of three shapes: a single
//! number, a boolean, or a sequence of numbers (one element per telemetry
//! sample). Comparisons over sequences produce 0/1 sequences, so boolean
//! information can live inside a [`Value::Sequence`] as well.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::eval::evaluator::{EvalError, EvalResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Scalar(f64),
    Boolean(bool),
    Sequence(Vec<f64>),
}

impl Value {
    /// Truthiness used by guards, logical operators and rule verdicts.
    ///
    /// A sequence is truthy only when it is non-empty and every element is
    /// non-zero, i.e. the condition held at every sample.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Scalar(x) => *x != 0.0,
            Value::Sequence(xs) => !xs.is_empty() && xs.iter().all(|x| *x != 0.0),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Boolean(_) => "boolean",
            Value::Sequence(_) => "sequence",
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[f64]> {
        match self {
            Value::Sequence(xs) => Some(xs),
            _ => None,
        }
    }

    /// Numeric view of the value; booleans are rejected.
    pub fn to_numbers(&self) -> EvalResult<Vec<f64>> {
        match self {
            Value::Scalar(x) => Ok(vec![*x]),
            Value::Sequence(xs) => Ok(xs.clone()),
            Value::Boolean(_) => Err(EvalError::Arithmetic(
                "expected a numeric value, found boolean".to_string(),
            )),
        }
    }

    /// Per-element truthiness. Scalars and booleans yield a single element.
    pub fn truth_elements(&self) -> Vec<bool> {
        match self {
            Value::Boolean(b) => vec![*b],
            Value::Scalar(x) => vec![*x != 0.0],
            Value::Sequence(xs) => xs.iter().map(|x| *x != 0.0).collect(),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Scalar(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(values: Vec<f64>) -> Self {
        Value::Sequence(values)
    }
}

impl From<&[f64]> for Value {
    fn from(values: &[f64]) -> Self {
        Value::Sequence(values.to_vec())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Scalar(x) => write!(f, "{}", x),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Sequence(xs) => {
                write!(f, "[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", x)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(Value::Boolean(true).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Scalar(0.5).is_truthy());
        assert!(!Value::Scalar(0.0).is_truthy());
        assert!(Value::Sequence(vec![1.0, 1.0]).is_truthy());
        assert!(!Value::Sequence(vec![1.0, 0.0]).is_truthy());
        // 空のシーケンスは偽
        assert!(!Value::Sequence(vec![]).is_truthy());
    }

    #[test]
    fn test_to_numbers_rejects_boolean() {
        assert_eq!(Value::Scalar(2.0).to_numbers().unwrap(), vec![2.0]);
        assert!(matches!(
            Value::Boolean(true).to_numbers(),
            Err(EvalError::Arithmetic(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Scalar(5.0).to_string(), "5");
        assert_eq!(Value::Sequence(vec![1.0, 2.5]).to_string(), "[1, 2.5]");
        assert_eq!(Value::Boolean(false).to_string(), "false");
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(Value::Sequence(vec![1.0, 2.0])).unwrap();
        assert_eq!(json, serde_json::json!({"Sequence": [1.0, 2.0]}));
        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, Value::Sequence(vec![1.0, 2.0]));
    }
}
