//! Turns a raw evaluation result into an [`EvaluationOutcome`].
//!
//! An expression whose root is a comparison (optionally behind a `when`
//! guard) is a *rule*: its truthiness is the verdict, and both sides of the
//! comparison are re-evaluated on their own so a report can show
//! "actual X vs threshold Y". Anything else is a *calculation* and its value
//! is passed through untouched.

use core::fmt;

use serde::{Serialize, Serializer};
use strum::Display;
use tracing::debug;

use crate::ast::Expression;
use crate::error::Error;
use crate::eval::{evaluate, EvalError, EvalResult, EvaluationContext};
use crate::registry::OperatorRegistry;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeKind {
    Calculation,
    Rule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    /// The `when` guard did not hold.
    Inapplicable,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutcome {
    pub kind: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Rule verdict. Unset for calculations and whenever evaluation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<Error>,
}

fn serialize_error<S: Serializer>(error: &Option<Error>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl EvaluationOutcome {
    pub fn failed(kind: OutcomeKind, error: impl Into<Error>) -> Self {
        Self {
            kind,
            value: None,
            passed: None,
            actual: None,
            expected: None,
            error: Some(error.into()),
        }
    }

    pub fn calculation(value: Value) -> Self {
        Self {
            kind: OutcomeKind::Calculation,
            value: Some(value),
            passed: None,
            actual: None,
            expected: None,
            error: None,
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        match &self.error {
            None => OutcomeStatus::Completed,
            Some(Error::Eval(EvalError::Inapplicable)) => OutcomeStatus::Inapplicable,
            Some(_) => OutcomeStatus::Failed,
        }
    }

    pub fn is_inapplicable(&self) -> bool {
        self.status() == OutcomeStatus::Inapplicable
    }
}

impl fmt::Display for EvaluationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status(), &self.error) {
            (OutcomeStatus::Inapplicable, _) => return write!(f, "{}: not applicable", self.kind),
            (_, Some(error)) => return write!(f, "{}: failed: {}", self.kind, error),
            _ => {}
        }
        match self.passed {
            Some(passed) => {
                write!(f, "rule: {}", if passed { "passed" } else { "violated" })?;
                if let (Some(actual), Some(expected)) = (&self.actual, &self.expected) {
                    write!(f, " (actual {} vs threshold {})", actual, expected)?;
                }
                Ok(())
            }
            None => match &self.value {
                Some(value) => write!(f, "{}: {}", self.kind, value),
                None => write!(f, "{}", self.kind),
            },
        }
    }
}

/// The kind implied by the shape of the tree.
pub fn infer_kind(ast: &Expression) -> OutcomeKind {
    if ast.is_rule() {
        OutcomeKind::Rule
    } else {
        OutcomeKind::Calculation
    }
}

pub fn classify(
    ast: &Expression,
    result: EvalResult<Value>,
    ctx: &EvaluationContext,
    registry: &OperatorRegistry,
) -> EvaluationOutcome {
    classify_as(infer_kind(ast), ast, result, ctx, registry)
}

/// Like [`classify`] but with the kind decided by the caller.
///
/// A forced rule without a root comparison still gets a verdict, only
/// `actual` and `expected` stay unset.
pub fn classify_as(
    kind: OutcomeKind,
    ast: &Expression,
    result: EvalResult<Value>,
    ctx: &EvaluationContext,
    registry: &OperatorRegistry,
) -> EvaluationOutcome {
    let value = match result {
        Ok(value) => value,
        Err(error) => return EvaluationOutcome::failed(kind, error),
    };

    if kind == OutcomeKind::Calculation {
        return EvaluationOutcome::calculation(value);
    }

    let (actual, expected) = match ast.root_comparison() {
        Some((_, left, right)) => (
            evaluate(left, ctx, registry).ok(),
            evaluate(right, ctx, registry).ok(),
        ),
        None => (None, None),
    };
    let passed = value.is_truthy();
    debug!(passed, "rule '{}' evaluated", ast);

    EvaluationOutcome {
        kind,
        value: Some(value),
        passed: Some(passed),
        actual,
        expected,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::analyzer::parse_expression;

    fn run(source: &str, ctx: &EvaluationContext) -> EvaluationOutcome {
        let registry = OperatorRegistry::with_builtins();
        let ast = parse_expression(source).unwrap();
        let result = evaluate(&ast, ctx, &registry);
        classify(&ast, result, ctx, &registry)
    }

    #[test]
    fn test_rule_reports_both_sides() {
        let outcome = run("max([1,2,3,4,5]) > 3", &EvaluationContext::new());
        assert_eq!(outcome.kind, OutcomeKind::Rule);
        assert_eq!(outcome.passed, Some(true));
        assert_eq!(outcome.actual, Some(Value::Scalar(5.0)));
        assert_eq!(outcome.expected, Some(Value::Scalar(3.0)));
        assert_eq!(outcome.status(), OutcomeStatus::Completed);
        assert_eq!(outcome.to_string(), "rule: passed (actual 5 vs threshold 3)");
    }

    #[test]
    fn test_sequence_rule_verdict() {
        let ctx = EvaluationContext::new().with("t", vec![172.0, 175.0, 180.0]);
        let outcome = run("t >= 174", &ctx);
        assert_eq!(outcome.passed, Some(false));
        assert_eq!(outcome.value, Some(Value::Sequence(vec![0.0, 1.0, 1.0])));
    }

    #[test]
    fn test_calculation_passthrough() {
        let outcome = run("1 + 2 * 3", &EvaluationContext::new());
        assert_eq!(outcome, EvaluationOutcome::calculation(Value::Scalar(7.0)));
        assert_eq!(outcome.to_string(), "calculation: 7");
    }

    #[test]
    fn test_inapplicable_is_not_a_failure() {
        let ctx = EvaluationContext::new()
            .with("p", 400.0)
            .with("t", vec![50.0]);
        let outcome = run("max(t) < 55 when p >= 600", &ctx);
        assert_eq!(outcome.kind, OutcomeKind::Rule);
        assert_eq!(outcome.status(), OutcomeStatus::Inapplicable);
        assert_eq!(outcome.passed, None);
        assert!(outcome.is_inapplicable());
    }

    #[test]
    fn test_failure_leaves_verdict_unset() {
        let outcome = run("pressure > 1", &EvaluationContext::new());
        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert_eq!(outcome.passed, None);
        assert_eq!(
            outcome.error,
            Some(Error::Eval(EvalError::UnboundVariable {
                name: "pressure".to_string()
            }))
        );
    }

    #[test]
    fn test_side_failure_only_clears_field() {
        let registry = OperatorRegistry::with_builtins();
        let ast = parse_expression("x == 1").unwrap();
        // x is unbound in this context, so only `actual` is lost
        let outcome = classify(
            &ast,
            Ok(Value::Boolean(true)),
            &EvaluationContext::new(),
            &registry,
        );
        assert_eq!(outcome.passed, Some(true));
        assert_eq!(outcome.actual, None);
        assert_eq!(outcome.expected, Some(Value::Scalar(1.0)));
    }

    #[test]
    fn test_forced_kind() {
        let registry = OperatorRegistry::with_builtins();
        let ctx = EvaluationContext::new();
        let ast = parse_expression("1 < 2").unwrap();
        let outcome = classify_as(
            OutcomeKind::Calculation,
            &ast,
            evaluate(&ast, &ctx, &registry),
            &ctx,
            &registry,
        );
        assert_eq!(outcome.passed, None);
        assert_eq!(outcome.value, Some(Value::Boolean(true)));

        let ast = parse_expression("all([1, 1])").unwrap();
        let outcome = classify_as(
            OutcomeKind::Rule,
            &ast,
            evaluate(&ast, &ctx, &registry),
            &ctx,
            &registry,
        );
        assert_eq!(outcome.passed, Some(true));
        assert_eq!(outcome.actual, None);
    }

    #[test]
    fn test_serialize_outcome() {
        let outcome = run("nope(1)", &EvaluationContext::new());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "calculation",
                "error": "Eval error: Unknown function: nope"
            })
        );
    }
}
