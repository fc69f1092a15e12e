use thiserror::Error;
use tracing::debug;

use super::context::EvaluationContext;
use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::registry::OperatorRegistry;
use crate::value::Value;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unbound variable: {name}")]
    UnboundVariable { name: String },
    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },
    #[error("Function '{name}' expects {expected} argument(s), found {found}")]
    ArityMismatch {
        name: String,
        expected: String,
        found: usize,
    },
    #[error("Sequence length mismatch: {left} vs {right}")]
    ShapeMismatch { left: usize, right: usize },
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
    /// The `when` guard did not hold. Not a failure of the rule.
    #[error("Rule not applicable: guard condition is false")]
    Inapplicable,
}

/// Evaluates `ast` against `ctx`, resolving function calls in `registry`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn evaluate(
    ast: &Expression,
    ctx: &EvaluationContext,
    registry: &OperatorRegistry,
) -> EvalResult<Value> {
    ExpressionEvaluator::new(registry).eval_expression(ast, ctx)
}

/// One side of an elementwise operation: a single value or one per sample.
enum Operand<T> {
    One(T),
    Many(Vec<T>),
}

pub struct ExpressionEvaluator<'a> {
    registry: &'a OperatorRegistry,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(registry: &'a OperatorRegistry) -> Self {
        Self { registry }
    }

    pub fn eval_expression(&self, expr: &Expression, ctx: &EvaluationContext) -> EvalResult<Value> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Variable(name) => self.eval_variable(name, ctx),
            Expression::UnaryOp { op, operand } => {
                let value = self.eval_expression(operand, ctx)?;
                self.eval_unary_op(*op, &value)
            }
            Expression::BinaryOp { op, left, right } if op.is_logical() => {
                self.eval_logical_op(*op, left, right, ctx)
            }
            Expression::BinaryOp { op, left, right } => {
                let left_val = self.eval_expression(left, ctx)?;
                let right_val = self.eval_expression(right, ctx)?;
                self.eval_binary_op(*op, &left_val, &right_val)
            }
            Expression::FunctionCall {
                function,
                arguments,
            } => self.eval_function_call(function, arguments, ctx),
            Expression::Conditional { value, guard } => {
                let guard_val = self.eval_expression(guard, ctx)?;
                if !guard_val.is_truthy() {
                    debug!("guard '{}' does not hold", guard);
                    return Err(EvalError::Inapplicable);
                }
                self.eval_expression(value, ctx)
            }
        }
    }

    fn eval_variable(&self, name: &str, ctx: &EvaluationContext) -> EvalResult<Value> {
        ctx.get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnboundVariable {
                name: name.to_string(),
            })
    }

    fn eval_function_call(
        &self,
        function: &str,
        arguments: &[Expression],
        ctx: &EvaluationContext,
    ) -> EvalResult<Value> {
        let args = arguments
            .iter()
            .map(|argument| self.eval_expression(argument, ctx))
            .collect::<EvalResult<Vec<_>>>()?;

        let descriptor =
            self.registry
                .resolve(function)
                .ok_or_else(|| EvalError::UnknownFunction {
                    name: function.to_string(),
                })?;
        debug!("calling {}({} args)", function, args.len());
        descriptor.call(&args)
    }

    fn eval_unary_op(&self, op: UnaryOperator, value: &Value) -> EvalResult<Value> {
        match (op, value) {
            (UnaryOperator::Negate, Value::Scalar(x)) => Ok(Value::Scalar(-x)),
            (UnaryOperator::Negate, Value::Sequence(xs)) => {
                Ok(Value::Sequence(xs.iter().map(|x| -x).collect()))
            }
            (UnaryOperator::Negate, Value::Boolean(_)) => Err(EvalError::Arithmetic(
                "cannot negate a boolean".to_string(),
            )),
            (UnaryOperator::Not, Value::Sequence(xs)) => Ok(Value::Sequence(
                xs.iter().map(|x| flag(*x == 0.0)).collect(),
            )),
            (UnaryOperator::Not, other) => Ok(Value::Boolean(!other.is_truthy())),
        }
    }

    fn eval_logical_op(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
        ctx: &EvaluationContext,
    ) -> EvalResult<Value> {
        let left_val = self.eval_expression(left, ctx)?;
        if !matches!(left_val, Value::Sequence(_)) {
            match (op, left_val.is_truthy()) {
                (BinaryOperator::And, false) => return Ok(Value::Boolean(false)),
                (BinaryOperator::Or, true) => return Ok(Value::Boolean(true)),
                _ => {}
            }
        }
        let right_val = self.eval_expression(right, ctx)?;
        self.eval_binary_op(op, &left_val, &right_val)
    }

    fn eval_binary_op(&self, op: BinaryOperator, left: &Value, right: &Value) -> EvalResult<Value> {
        match op {
            BinaryOperator::Add
            | BinaryOperator::Subtract
            | BinaryOperator::Multiply
            | BinaryOperator::Divide => self.eval_arithmetic(op, left, right),
            BinaryOperator::Equal | BinaryOperator::NotEqual => {
                let eq = op == BinaryOperator::Equal;
                let result = zip_with(equality_operand(left), equality_operand(right), |l, r| {
                    Ok((l == r) == eq)
                })?;
                Ok(truth_value(result))
            }
            BinaryOperator::LessThan
            | BinaryOperator::GreaterThan
            | BinaryOperator::LessThanEqual
            | BinaryOperator::GreaterThanEqual => {
                let result = zip_with(
                    numeric_operand(op, left, right, left)?,
                    numeric_operand(op, left, right, right)?,
                    |l, r| {
                        Ok(match op {
                            BinaryOperator::LessThan => l < r,
                            BinaryOperator::GreaterThan => l > r,
                            BinaryOperator::LessThanEqual => l <= r,
                            _ => l >= r,
                        })
                    },
                )?;
                Ok(truth_value(result))
            }
            BinaryOperator::And | BinaryOperator::Or => {
                let combine = |l: bool, r: bool| -> EvalResult<bool> {
                    Ok(if op == BinaryOperator::And {
                        l && r
                    } else {
                        l || r
                    })
                };
                Ok(truth_value(zip_with(
                    truth_operand(left),
                    truth_operand(right),
                    combine,
                )?))
            }
        }
    }

    fn eval_arithmetic(
        &self,
        op: BinaryOperator,
        left: &Value,
        right: &Value,
    ) -> EvalResult<Value> {
        let result = zip_with(
            numeric_operand(op, left, right, left)?,
            numeric_operand(op, left, right, right)?,
            |l, r| match op {
                BinaryOperator::Add => Ok(l + r),
                BinaryOperator::Subtract => Ok(l - r),
                BinaryOperator::Multiply => Ok(l * r),
                _ => {
                    if r == 0.0 {
                        return Err(EvalError::Arithmetic("division by zero".to_string()));
                    }
                    Ok(l / r)
                }
            },
        )?;
        Ok(match result {
            Operand::One(x) => Value::Scalar(x),
            Operand::Many(xs) => Value::Sequence(xs),
        })
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn numeric_operand(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    side: &Value,
) -> EvalResult<Operand<f64>> {
    match side {
        Value::Scalar(x) => Ok(Operand::One(*x)),
        Value::Sequence(xs) => Ok(Operand::Many(xs.clone())),
        Value::Boolean(_) => Err(EvalError::Arithmetic(format!(
            "cannot apply '{}' to {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))),
    }
}

// booleans compare as 1/0
fn equality_operand(value: &Value) -> Operand<f64> {
    match value {
        Value::Scalar(x) => Operand::One(*x),
        Value::Boolean(b) => Operand::One(flag(*b)),
        Value::Sequence(xs) => Operand::Many(xs.clone()),
    }
}

fn truth_operand(value: &Value) -> Operand<bool> {
    match value {
        Value::Sequence(_) => Operand::Many(value.truth_elements()),
        other => Operand::One(other.is_truthy()),
    }
}

fn truth_value(result: Operand<bool>) -> Value {
    match result {
        Operand::One(b) => Value::Boolean(b),
        Operand::Many(bs) => Value::Sequence(bs.into_iter().map(flag).collect()),
    }
}

/// Applies `f` elementwise, broadcasting a single value across a sequence.
fn zip_with<T: Copy, R>(
    left: Operand<T>,
    right: Operand<T>,
    f: impl Fn(T, T) -> EvalResult<R>,
) -> EvalResult<Operand<R>> {
    match (left, right) {
        (Operand::One(l), Operand::One(r)) => f(l, r).map(Operand::One),
        (Operand::Many(ls), Operand::One(r)) => ls
            .into_iter()
            .map(|l| f(l, r))
            .collect::<EvalResult<Vec<_>>>()
            .map(Operand::Many),
        (Operand::One(l), Operand::Many(rs)) => rs
            .into_iter()
            .map(|r| f(l, r))
            .collect::<EvalResult<Vec<_>>>()
            .map(Operand::Many),
        (Operand::Many(ls), Operand::Many(rs)) => {
            if ls.len() != rs.len() {
                return Err(EvalError::ShapeMismatch {
                    left: ls.len(),
                    right: rs.len(),
                });
            }
            ls.into_iter()
                .zip(rs)
                .map(|(l, r)| f(l, r))
                .collect::<EvalResult<Vec<_>>>()
                .map(Operand::Many)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::analyzer::parse_expression;

    fn eval(source: &str, ctx: &EvaluationContext) -> EvalResult<Value> {
        let registry = OperatorRegistry::with_builtins();
        evaluate(&parse_expression(source).unwrap(), ctx, &registry)
    }

    fn eval_empty(source: &str) -> EvalResult<Value> {
        eval(source, &EvaluationContext::new())
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(eval_empty("1 + 2 * 3"), Ok(Value::Scalar(7.0)));
        assert_eq!(eval_empty("(1 + 2) * 3"), Ok(Value::Scalar(9.0)));
        assert_eq!(eval_empty("10 - 4 - 3"), Ok(Value::Scalar(3.0)));
        assert_eq!(eval_empty("-2 * -3"), Ok(Value::Scalar(6.0)));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(eval_empty("1 / 0"), Err(EvalError::Arithmetic(_))));
        assert!(matches!(
            eval_empty("[1, 2] / [1, 0]"),
            Err(EvalError::Arithmetic(_))
        ));
    }

    #[test]
    fn test_sequence_broadcasting() {
        assert_eq!(
            eval_empty("[1, 2, 3] * 2"),
            Ok(Value::Sequence(vec![2.0, 4.0, 6.0]))
        );
        assert_eq!(
            eval_empty("10 - [1, 2]"),
            Ok(Value::Sequence(vec![9.0, 8.0]))
        );
        assert_eq!(
            eval_empty("[1, 2] + [10, 20]"),
            Ok(Value::Sequence(vec![11.0, 22.0]))
        );
        assert_eq!(
            eval_empty("[1, 2] + [1, 2, 3]"),
            Err(EvalError::ShapeMismatch { left: 2, right: 3 })
        );
    }

    #[test]
    fn test_sequence_comparison() {
        let ctx = EvaluationContext::new().with("thermocouples", vec![172.0, 175.0, 180.0]);
        assert_eq!(
            eval("thermocouples >= 174", &ctx),
            Ok(Value::Sequence(vec![0.0, 1.0, 1.0]))
        );
        assert_eq!(eval("3 > 2", &ctx), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_boolean_operands() {
        assert_eq!(eval_empty("true == true"), Ok(Value::Boolean(true)));
        assert_eq!(eval_empty("true != 1"), Ok(Value::Boolean(false)));
        assert!(matches!(eval_empty("true < 1"), Err(EvalError::Arithmetic(_))));
        assert!(matches!(eval_empty("true + 1"), Err(EvalError::Arithmetic(_))));
        assert!(matches!(eval_empty("-true"), Err(EvalError::Arithmetic(_))));
    }

    #[test]
    fn test_logical_short_circuit() {
        // the right side would fail if evaluated
        assert_eq!(eval_empty("false and missing > 1"), Ok(Value::Boolean(false)));
        assert_eq!(eval_empty("true or missing > 1"), Ok(Value::Boolean(true)));
        assert_eq!(
            eval_empty("true and missing > 1"),
            Err(EvalError::UnboundVariable {
                name: "missing".to_string()
            })
        );
    }

    #[test]
    fn test_logical_elementwise() {
        assert_eq!(
            eval_empty("[1, 0, 1] and [1, 1, 0]"),
            Ok(Value::Sequence(vec![1.0, 0.0, 0.0]))
        );
        assert_eq!(
            eval_empty("true and [1, 0]"),
            Ok(Value::Sequence(vec![1.0, 0.0]))
        );
        assert_eq!(eval_empty("not [1, 0]"), Ok(Value::Sequence(vec![0.0, 1.0])));
        assert_eq!(eval_empty("not 0"), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_unbound_variable() {
        assert_eq!(
            eval_empty("pressure + 1"),
            Err(EvalError::UnboundVariable {
                name: "pressure".to_string()
            })
        );
    }

    #[test]
    fn test_function_call_errors() {
        assert_eq!(
            eval_empty("nope(1)"),
            Err(EvalError::UnknownFunction {
                name: "nope".to_string()
            })
        );
        // arguments are evaluated before the name is resolved
        assert_eq!(
            eval_empty("nope(x)"),
            Err(EvalError::UnboundVariable {
                name: "x".to_string()
            })
        );
        assert!(matches!(
            eval_empty("abs(1, 2)"),
            Err(EvalError::ArityMismatch { found: 2, .. })
        ));
    }

    #[test]
    fn test_conditional() {
        let ctx = EvaluationContext::new()
            .with("p", 400.0)
            .with("t", vec![50.0]);
        assert_eq!(
            eval("max(t) < 55 when p >= 600", &ctx),
            Err(EvalError::Inapplicable)
        );
        let ctx = ctx.with("p", 612.0);
        assert_eq!(
            eval("max(t) < 55 when p >= 600", &ctx),
            Ok(Value::Boolean(true))
        );
        // an empty guard never applies
        assert_eq!(eval_empty("1 when []"), Err(EvalError::Inapplicable));
    }

    #[test]
    fn test_builtin_reduction() {
        let ctx = EvaluationContext::new().with("thermocouples", vec![172.0, 175.0, 180.0]);
        assert_eq!(
            eval("all(thermocouples >= 174)", &ctx),
            Ok(Value::Boolean(false))
        );
        assert_eq!(
            eval("any(thermocouples >= 174)", &ctx),
            Ok(Value::Boolean(true))
        );
        assert_eq!(eval("max([1,2,3,4,5]) > 3", &ctx), Ok(Value::Boolean(true)));
    }
}
