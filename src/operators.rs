//! Configurable telemetry operators.
//!
//! Unlike the generic [builtins](crate::registry::builtins), these operators
//! are parameterised by the deployment (sampling interval, chosen name) and
//! are usually declared in an [`EngineConfig`](crate::config::EngineConfig):
//!
//! ```
//! use kensa::operators::OperatorSpec;
//!
//! let spec: OperatorSpec = serde_json::from_str(
//!     r#"{"kind": "rate_of_change", "name": "rate", "sample_interval": 0.5}"#,
//! ).unwrap();
//! assert_eq!(spec.name(), "rate");
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::eval::evaluator::{EvalError, EvalResult};
use crate::registry::OperatorRegistry;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperatorSpec {
    /// `name(seq)`: differences between successive samples.
    Difference { name: String },
    /// `name(seq)`: successive differences per second.
    RateOfChange { name: String, sample_interval: f64 },
    /// `name(seq, threshold)`: seconds spent strictly above `threshold`.
    DurationAbove { name: String, sample_interval: f64 },
}

impl OperatorSpec {
    pub fn name(&self) -> &str {
        match self {
            OperatorSpec::Difference { name }
            | OperatorSpec::RateOfChange { name, .. }
            | OperatorSpec::DurationAbove { name, .. } => name,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            OperatorSpec::Difference { .. } => Ok(()),
            OperatorSpec::RateOfChange {
                name,
                sample_interval,
            }
            | OperatorSpec::DurationAbove {
                name,
                sample_interval,
            } => {
                if sample_interval.is_finite() && *sample_interval > 0.0 {
                    Ok(())
                } else {
                    Err(ConfigError::InvalidInterval {
                        operator: name.clone(),
                        interval: *sample_interval,
                    })
                }
            }
        }
    }

    /// Validates the definition and registers the operator, replacing any operator
    /// of the same name.
    pub fn register(&self, registry: &OperatorRegistry) -> Result<(), ConfigError> {
        self.validate()?;
        match self {
            OperatorSpec::Difference { name } => {
                let label = name.clone();
                registry.register(
                    name.clone(),
                    1,
                    Some(1),
                    move |args: &[Value]| -> EvalResult<Value> {
                        Ok(Value::Sequence(differences(&label, &args[0])?))
                    },
                );
            }
            OperatorSpec::RateOfChange {
                name,
                sample_interval,
            } => {
                let (label, interval) = (name.clone(), *sample_interval);
                registry.register(
                    name.clone(),
                    1,
                    Some(1),
                    move |args: &[Value]| -> EvalResult<Value> {
                        let rates = differences(&label, &args[0])?
                            .into_iter()
                            .map(|d| d / interval)
                            .collect();
                        Ok(Value::Sequence(rates))
                    },
                );
            }
            OperatorSpec::DurationAbove {
                name,
                sample_interval,
            } => {
                let (label, interval) = (name.clone(), *sample_interval);
                registry.register(
                    name.clone(),
                    2,
                    Some(2),
                    move |args: &[Value]| -> EvalResult<Value> {
                        let samples = samples(&label, &args[0])?;
                        let threshold = args[1].as_scalar().ok_or_else(|| {
                            EvalError::Arithmetic(format!(
                                "{}() threshold must be a scalar, found {}",
                                label,
                                args[1].type_name()
                            ))
                        })?;
                        let above = samples.iter().filter(|x| **x > threshold).count();
                        Ok(Value::Scalar(above as f64 * interval))
                    },
                );
            }
        }
        Ok(())
    }
}

fn samples(name: &str, value: &Value) -> EvalResult<Vec<f64>> {
    value.to_numbers().map_err(|_| {
        EvalError::Arithmetic(format!("{}() expects a numeric sequence, found boolean", name))
    })
}

fn differences(name: &str, value: &Value) -> EvalResult<Vec<f64>> {
    Ok(samples(name, value)?
        .windows(2)
        .map(|w| w[1] - w[0])
        .collect())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn call(registry: &OperatorRegistry, name: &str, args: &[Value]) -> EvalResult<Value> {
        registry.resolve(name).unwrap().call(args)
    }

    #[test]
    fn test_deserialize_tagged() {
        let specs: Vec<OperatorSpec> = serde_json::from_str(
            r#"[
                {"kind": "difference", "name": "diff"},
                {"kind": "duration_above", "name": "time_above", "sample_interval": 2.0}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            specs,
            vec![
                OperatorSpec::Difference {
                    name: "diff".to_string()
                },
                OperatorSpec::DurationAbove {
                    name: "time_above".to_string(),
                    sample_interval: 2.0
                },
            ]
        );
    }

    #[test]
    fn test_difference_and_rate() {
        let registry = OperatorRegistry::empty();
        OperatorSpec::Difference {
            name: "diff".to_string(),
        }
        .register(&registry)
        .unwrap();
        OperatorSpec::RateOfChange {
            name: "rate".to_string(),
            sample_interval: 0.5,
        }
        .register(&registry)
        .unwrap();

        let series = Value::Sequence(vec![10.0, 11.0, 13.0]);
        assert_eq!(
            call(&registry, "diff", &[series.clone()]),
            Ok(Value::Sequence(vec![1.0, 2.0]))
        );
        assert_eq!(
            call(&registry, "rate", &[series]),
            Ok(Value::Sequence(vec![2.0, 4.0]))
        );
        assert_eq!(
            call(&registry, "diff", &[Value::Scalar(1.0)]),
            Ok(Value::Sequence(vec![]))
        );
    }

    #[test]
    fn test_duration_above() {
        let registry = OperatorRegistry::empty();
        OperatorSpec::DurationAbove {
            name: "time_above".to_string(),
            sample_interval: 10.0,
        }
        .register(&registry)
        .unwrap();

        let series = Value::Sequence(vec![170.0, 175.0, 174.0, 180.0]);
        assert_eq!(
            call(&registry, "time_above", &[series.clone(), Value::Scalar(174.0)]),
            Ok(Value::Scalar(20.0))
        );
        assert!(matches!(
            call(&registry, "time_above", &[series, Value::Boolean(true)]),
            Err(EvalError::Arithmetic(_))
        ));
    }

    #[test]
    fn test_invalid_interval() {
        let registry = OperatorRegistry::empty();
        for interval in [0.0, -1.0, f64::NAN] {
            let spec = OperatorSpec::RateOfChange {
                name: "rate".to_string(),
                sample_interval: interval,
            };
            assert!(matches!(
                spec.register(&registry),
                Err(ConfigError::InvalidInterval { .. })
            ));
        }
        assert!(!registry.contains("rate"));
    }
}
