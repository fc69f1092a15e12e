use core::fmt;
use std::collections::BTreeSet;

use strum::{AsRefStr, Display};

use crate::value::Value;

// 式のAST
//
// Nodes own their children exclusively and are never mutated after parsing,
// so a parsed tree can be shared behind an `Arc` across threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    /// Resolved against the evaluation context, not at parse time.
    Variable(String),
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Resolved against the operator registry at evaluation time.
    FunctionCall {
        function: String,
        arguments: Vec<Expression>,
    },
    /// `value when guard`
    Conditional {
        value: Box<Expression>,
        guard: Box<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum UnaryOperator {
    #[strum(serialize = "-")]
    Negate,
    #[strum(serialize = "not")]
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum BinaryOperator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = "<=")]
    LessThanEqual,
    #[strum(serialize = ">=")]
    GreaterThanEqual,
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::GreaterThan
                | BinaryOperator::LessThanEqual
                | BinaryOperator::GreaterThanEqual
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            op if op.is_comparison() => 4,
            BinaryOperator::Add | BinaryOperator::Subtract => 5,
            _ => 6,
        }
    }
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn call(function: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            function: function.into(),
            arguments,
        }
    }

    pub fn conditional(value: Expression, guard: Expression) -> Self {
        Expression::Conditional {
            value: Box::new(value),
            guard: Box::new(guard),
        }
    }

    /// The comparison at the root of a rule, looking through a top-level
    /// `when` guard. Returns `(op, left, right)`.
    pub fn root_comparison(&self) -> Option<(BinaryOperator, &Expression, &Expression)> {
        match self {
            Expression::BinaryOp { op, left, right } if op.is_comparison() => {
                Some((*op, left.as_ref(), right.as_ref()))
            }
            Expression::Conditional { value, .. } => value.root_comparison(),
            _ => None,
        }
    }

    pub fn is_rule(&self) -> bool {
        self.root_comparison().is_some()
    }

    /// Names of all variables referenced anywhere in the tree.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.walk(&mut |expr| {
            if let Expression::Variable(name) = expr {
                names.insert(name.clone());
            }
        });
        names
    }

    /// Names of all functions called anywhere in the tree.
    pub fn functions(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.walk(&mut |expr| {
            if let Expression::FunctionCall { function, .. } = expr {
                names.insert(function.clone());
            }
        });
        names
    }

    fn walk(&self, visit: &mut impl FnMut(&Expression)) {
        visit(self);
        match self {
            Expression::Literal(_) | Expression::Variable(_) => {}
            Expression::UnaryOp { operand, .. } => operand.walk(visit),
            Expression::BinaryOp { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expression::FunctionCall { arguments, .. } => {
                for argument in arguments {
                    argument.walk(visit);
                }
            }
            Expression::Conditional { value, guard } => {
                value.walk(visit);
                guard.walk(visit);
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::Conditional { .. } => 0,
            Expression::BinaryOp { op, .. } => op.precedence(),
            Expression::UnaryOp {
                op: UnaryOperator::Not,
                ..
            } => 3,
            Expression::UnaryOp {
                op: UnaryOperator::Negate,
                ..
            } => 7,
            _ => 8,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Renders the expression back to source form, adding parentheses only where
/// precedence requires them.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::UnaryOp { op, operand } => match op {
                UnaryOperator::Not => {
                    write!(f, "not ")?;
                    operand.fmt_operand(f, 3)
                }
                UnaryOperator::Negate => {
                    write!(f, "-")?;
                    // -(3) must not collapse into the literal -3
                    if matches!(operand.as_ref(), Expression::Literal(Value::Scalar(_))) {
                        write!(f, "({})", operand)
                    } else {
                        operand.fmt_operand(f, 7)
                    }
                }
            },
            Expression::BinaryOp { op, left, right } => {
                let precedence = op.precedence();
                let left_min = if op.is_comparison() {
                    precedence + 1
                } else {
                    precedence
                };
                left.fmt_operand(f, left_min)?;
                write!(f, " {} ", op)?;
                right.fmt_operand(f, precedence + 1)
            }
            Expression::FunctionCall {
                function,
                arguments,
            } => {
                write!(f, "{}(", function)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    argument.fmt_operand(f, 1)?;
                }
                write!(f, ")")
            }
            Expression::Conditional { value, guard } => {
                value.fmt_operand(f, 1)?;
                write!(f, " when ")?;
                guard.fmt_operand(f, 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> Expression {
        // max(t) < 55 when p >= 600
        Expression::conditional(
            Expression::binary(
                BinaryOperator::LessThan,
                Expression::call("max", vec![Expression::variable("t")]),
                Expression::literal(55.0),
            ),
            Expression::binary(
                BinaryOperator::GreaterThanEqual,
                Expression::variable("p"),
                Expression::literal(600.0),
            ),
        )
    }

    #[test]
    fn test_root_comparison_through_guard() {
        let expr = rule();
        let (op, left, right) = expr.root_comparison().unwrap();
        assert_eq!(op, BinaryOperator::LessThan);
        assert_eq!(left, &Expression::call("max", vec![Expression::variable("t")]));
        assert_eq!(right, &Expression::literal(55.0));
        assert!(expr.is_rule());
    }

    #[test]
    fn test_calculation_is_not_rule() {
        let expr = Expression::binary(
            BinaryOperator::Add,
            Expression::variable("a"),
            Expression::literal(1.0),
        );
        assert!(!expr.is_rule());
        // and/or at the root is a calculation, not a comparison
        let expr = Expression::binary(
            BinaryOperator::And,
            Expression::literal(true),
            Expression::literal(false),
        );
        assert!(!expr.is_rule());
    }

    #[test]
    fn test_collect_names() {
        let expr = rule();
        assert_eq!(
            expr.variables().into_iter().collect::<Vec<_>>(),
            vec!["p".to_string(), "t".to_string()]
        );
        assert_eq!(
            expr.functions().into_iter().collect::<Vec<_>>(),
            vec!["max".to_string()]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(rule().to_string(), "max(t) < 55 when p >= 600");

        let expr = Expression::binary(
            BinaryOperator::Multiply,
            Expression::binary(
                BinaryOperator::Add,
                Expression::literal(1.0),
                Expression::literal(2.0),
            ),
            Expression::literal(3.0),
        );
        assert_eq!(expr.to_string(), "(1 + 2) * 3");

        let expr = Expression::binary(
            BinaryOperator::Subtract,
            Expression::literal(1.0),
            Expression::binary(
                BinaryOperator::Subtract,
                Expression::literal(2.0),
                Expression::literal(3.0),
            ),
        );
        assert_eq!(expr.to_string(), "1 - (2 - 3)");

        let expr = Expression::unary(UnaryOperator::Negate, Expression::literal(3.0));
        assert_eq!(expr.to_string(), "-(3)");

        let expr = Expression::unary(
            UnaryOperator::Not,
            Expression::binary(
                BinaryOperator::Or,
                Expression::variable("a"),
                Expression::variable("b"),
            ),
        );
        assert_eq!(expr.to_string(), "not (a or b)");
    }
}
