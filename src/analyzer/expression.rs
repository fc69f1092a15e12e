//! Precedence-climbing parser for rule expressions.
//!
//! Binding strength, lowest first:
//!
//! ```text
//! when  <  or  <  and  <  not  <  comparison  <  + -  <  * /  <  unary -  <  call / group / literal
//! ```
//!
//! Comparisons are non-associative: a clause holds at most one. `when` splits
//! the top-level clause into a [`Expression::Conditional`] and may appear
//! nowhere else. Function arity is not checked here; names are resolved
//! against the registry at evaluation time.

use super::core::{ParseError, ParseResult, Parser};
use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::tokenizer::{
    keyword::Keyword,
    literal::Literal,
    symbol::{Delimiter, Operator},
    Token, TokenSpan,
};
use crate::value::Value;

/// Deepest nesting accepted, counted both as open groups, calls and prefix
/// operators while parsing and as the height of the resulting tree.
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionParser;

impl Parser<TokenSpan, Expression> for ExpressionParser {
    /// Parses one top-level clause with an optional `when` guard. Input after
    /// the expression is left for the caller to reject.
    fn parse(&self, input: &[TokenSpan], pos: usize) -> ParseResult<Expression> {
        let (pos, value) = self.parse_or(input, pos, 0)?;
        match input.get(pos) {
            Some(when) if is_keyword(when, Keyword::When) => {
                let (pos, guard) = self.parse_or(input, pos + 1, 0)?;
                if let Some(span) = input.get(pos).filter(|s| is_keyword(s, Keyword::When)) {
                    return Err(ParseError::MisplacedGuard {
                        position: span.start,
                    });
                }
                deeper(when, value.height.max(guard.height))?;
                Ok((pos, Expression::conditional(value.expression, guard.expression)))
            }
            _ => Ok((pos, value.expression)),
        }
    }
}

/// A parsed subtree and the height of its tree. Leaves have height 0.
#[derive(Debug)]
struct Subtree {
    expression: Expression,
    height: usize,
}

impl Subtree {
    fn leaf(expression: Expression) -> Self {
        Self {
            expression,
            height: 0,
        }
    }

    fn unary(self, span: &TokenSpan, op: UnaryOperator) -> Result<Self, ParseError> {
        Ok(Self {
            height: deeper(span, self.height)?,
            expression: Expression::unary(op, self.expression),
        })
    }

    fn binary(self, span: &TokenSpan, op: BinaryOperator, right: Self) -> Result<Self, ParseError> {
        Ok(Self {
            height: deeper(span, self.height.max(right.height))?,
            expression: Expression::binary(op, self.expression, right.expression),
        })
    }
}

impl ExpressionParser {
    fn parse_or(&self, input: &[TokenSpan], pos: usize, depth: usize) -> ParseResult<Subtree> {
        let (mut pos, mut left) = self.parse_and(input, pos, depth)?;
        while let Some(span) = input.get(pos).filter(|s| is_keyword(s, Keyword::Or)) {
            let (next, right) = self.parse_and(input, pos + 1, depth)?;
            left = left.binary(span, BinaryOperator::Or, right)?;
            pos = next;
        }
        Ok((pos, left))
    }

    fn parse_and(&self, input: &[TokenSpan], pos: usize, depth: usize) -> ParseResult<Subtree> {
        let (mut pos, mut left) = self.parse_not(input, pos, depth)?;
        while let Some(span) = input.get(pos).filter(|s| is_keyword(s, Keyword::And)) {
            let (next, right) = self.parse_not(input, pos + 1, depth)?;
            left = left.binary(span, BinaryOperator::And, right)?;
            pos = next;
        }
        Ok((pos, left))
    }

    fn parse_not(&self, input: &[TokenSpan], pos: usize, depth: usize) -> ParseResult<Subtree> {
        match input.get(pos) {
            Some(span) if is_keyword(span, Keyword::Not) => {
                let depth = deeper(span, depth)?;
                let (pos, operand) = self.parse_not(input, pos + 1, depth)?;
                Ok((pos, operand.unary(span, UnaryOperator::Not)?))
            }
            _ => self.parse_comparison(input, pos, depth),
        }
    }

    fn parse_comparison(
        &self,
        input: &[TokenSpan],
        pos: usize,
        depth: usize,
    ) -> ParseResult<Subtree> {
        let (pos, left) = self.parse_additive(input, pos, depth)?;
        let Some(span) = input.get(pos) else {
            return Ok((pos, left));
        };
        let Some(op) = comparison_operator(span) else {
            return Ok((pos, left));
        };
        let (pos, right) = self.parse_additive(input, pos + 1, depth)?;
        if let Some(next) = input.get(pos).filter(|s| comparison_operator(s).is_some()) {
            return Err(ParseError::ChainedComparison {
                position: next.start,
            });
        }
        Ok((pos, left.binary(span, op, right)?))
    }

    fn parse_additive(
        &self,
        input: &[TokenSpan],
        pos: usize,
        depth: usize,
    ) -> ParseResult<Subtree> {
        let (mut pos, mut left) = self.parse_multiplicative(input, pos, depth)?;
        while let Some(span) = input.get(pos) {
            let op = match &span.token {
                Token::Operator(Operator::Plus) => BinaryOperator::Add,
                Token::Operator(Operator::Minus) => BinaryOperator::Subtract,
                _ => break,
            };
            let (next, right) = self.parse_multiplicative(input, pos + 1, depth)?;
            left = left.binary(span, op, right)?;
            pos = next;
        }
        Ok((pos, left))
    }

    // 乗除算 (*, /)
    fn parse_multiplicative(
        &self,
        input: &[TokenSpan],
        pos: usize,
        depth: usize,
    ) -> ParseResult<Subtree> {
        let (mut pos, mut left) = self.parse_unary(input, pos, depth)?;
        while let Some(span) = input.get(pos) {
            let op = match &span.token {
                Token::Operator(Operator::Multiply) => BinaryOperator::Multiply,
                Token::Operator(Operator::Divide) => BinaryOperator::Divide,
                _ => break,
            };
            let (next, right) = self.parse_unary(input, pos + 1, depth)?;
            left = left.binary(span, op, right)?;
            pos = next;
        }
        Ok((pos, left))
    }

    fn parse_unary(&self, input: &[TokenSpan], pos: usize, depth: usize) -> ParseResult<Subtree> {
        match input.get(pos) {
            Some(span) if span.token == Token::Operator(Operator::Minus) => {
                let depth = deeper(span, depth)?;
                let (pos, operand) = self.parse_unary(input, pos + 1, depth)?;
                Ok((pos, operand.unary(span, UnaryOperator::Negate)?))
            }
            _ => self.parse_primary(input, pos, depth),
        }
    }

    fn parse_primary(
        &self,
        input: &[TokenSpan],
        pos: usize,
        depth: usize,
    ) -> ParseResult<Subtree> {
        let Some(span) = input.get(pos) else {
            return Err(unexpected(input, pos, "expression"));
        };
        let value = match &span.token {
            Token::Literal(Literal::Number(n)) => Value::Scalar(*n),
            Token::Literal(Literal::Boolean(b)) => Value::Boolean(*b),
            Token::Literal(Literal::List(items)) => Value::Sequence(items.clone()),
            Token::Identifier(name) if opens_call(input, pos) => {
                return self.parse_call(input, pos, name, depth);
            }
            Token::Identifier(name) => {
                return Ok((pos + 1, Subtree::leaf(Expression::Variable(name.clone()))));
            }
            Token::Delimiter(Delimiter::OpenParen) => return self.parse_group(input, pos, depth),
            _ => return Err(unexpected(input, pos, "expression")),
        };
        Ok((pos + 1, Subtree::leaf(Expression::Literal(value))))
    }

    fn parse_group(&self, input: &[TokenSpan], open: usize, depth: usize) -> ParseResult<Subtree> {
        let depth = deeper(&input[open], depth)?;
        let (pos, inner) = self
            .parse_or(input, open + 1, depth)
            .map_err(|e| unclosed(input, open, e))?;
        expect_close(input, pos, open, "')'")?;
        Ok((pos + 1, inner))
    }

    fn parse_call(
        &self,
        input: &[TokenSpan],
        name_pos: usize,
        name: &str,
        depth: usize,
    ) -> ParseResult<Subtree> {
        let open = name_pos + 1;
        let depth = deeper(&input[open], depth)?;
        let mut arguments = Vec::new();
        let mut height = 0;
        let mut pos = open + 1;

        let empty = input
            .get(pos)
            .is_some_and(|s| is_delimiter(s, Delimiter::CloseParen));
        if !empty {
            loop {
                let (next, argument) = self
                    .parse_or(input, pos, depth)
                    .map_err(|e| unclosed(input, open, e))?;
                height = height.max(argument.height);
                arguments.push(argument.expression);
                match input.get(next) {
                    Some(s) if is_delimiter(s, Delimiter::Comma) => pos = next + 1,
                    _ => {
                        expect_close(input, next, open, "',' or ')'")?;
                        pos = next;
                        break;
                    }
                }
            }
        }

        let call = Subtree {
            height: deeper(&input[name_pos], height)?,
            expression: Expression::call(name, arguments),
        };
        Ok((pos + 1, call))
    }
}

/// One level below `level`, or `NestingTooDeep` once the limit is reached.
fn deeper(span: &TokenSpan, level: usize) -> Result<usize, ParseError> {
    if level >= MAX_NESTING_DEPTH {
        return Err(ParseError::NestingTooDeep {
            limit: MAX_NESTING_DEPTH,
            position: span.start,
        });
    }
    Ok(level + 1)
}

fn expect_close(
    input: &[TokenSpan],
    pos: usize,
    open: usize,
    expected: &str,
) -> Result<(), ParseError> {
    match input.get(pos) {
        Some(s) if is_delimiter(s, Delimiter::CloseParen) => Ok(()),
        Some(s) if is_keyword(s, Keyword::When) => {
            Err(ParseError::MisplacedGuard { position: s.start })
        }
        Some(_) => Err(unexpected(input, pos, expected)),
        None => Err(unbalanced(input, open)),
    }
}

/// Input that runs out inside a group is reported against the group's `(`.
fn unclosed(input: &[TokenSpan], open: usize, error: ParseError) -> ParseError {
    match error {
        ParseError::UnexpectedEnd { .. } => unbalanced(input, open),
        other => other,
    }
}

fn unbalanced(input: &[TokenSpan], open: usize) -> ParseError {
    ParseError::UnbalancedDelimiter {
        delimiter: Delimiter::OpenParen.to_string(),
        position: input[open].start,
    }
}

fn unexpected(input: &[TokenSpan], pos: usize, expected: &str) -> ParseError {
    match input.get(pos) {
        Some(span) => ParseError::UnexpectedToken {
            found: span.text.clone(),
            expected: expected.to_string(),
            position: span.start,
        },
        None => ParseError::UnexpectedEnd {
            expected: expected.to_string(),
        },
    }
}

fn is_keyword(span: &TokenSpan, keyword: Keyword) -> bool {
    span.token == Token::Keyword(keyword)
}

fn is_delimiter(span: &TokenSpan, delimiter: Delimiter) -> bool {
    span.token == Token::Delimiter(delimiter)
}

fn opens_call(input: &[TokenSpan], name_pos: usize) -> bool {
    input
        .get(name_pos + 1)
        .is_some_and(|s| is_delimiter(s, Delimiter::OpenParen))
}

fn comparison_operator(span: &TokenSpan) -> Option<BinaryOperator> {
    match &span.token {
        Token::Operator(op) => match op {
            Operator::EqualEqual => Some(BinaryOperator::Equal),
            Operator::NotEqual => Some(BinaryOperator::NotEqual),
            Operator::Less => Some(BinaryOperator::LessThan),
            Operator::LessEqual => Some(BinaryOperator::LessThanEqual),
            Operator::Greater => Some(BinaryOperator::GreaterThan),
            Operator::GreaterEqual => Some(BinaryOperator::GreaterThanEqual),
            _ => None,
        },
        _ => None,
    }
}
