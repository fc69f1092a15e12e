//! # Analyzer
//!
//! Turns the token stream produced by the [`tokenizer`](crate::tokenizer)
//! into an [`Expression`] tree.
//!
//! ```
//! use kensa::analyzer::parse_expression;
//!
//! let ast = parse_expression("max(t) < 55 when p >= 600").unwrap();
//! assert!(ast.is_rule());
//! assert_eq!(ast.to_string(), "max(t) < 55 when p >= 600");
//! ```

pub mod core;
pub mod expression;

pub use self::core::ParseError;
pub use self::core::ParseResult;
pub use self::core::Parser;
pub use expression::{ExpressionParser, MAX_NESTING_DEPTH};

use crate::ast::Expression;
use crate::tokenizer::{symbol::Delimiter, tokenize, Token, TokenSpan};

/// Parses a complete token stream. Every token must be consumed.
#[tracing::instrument(level = "debug", skip(tokens), fields(count = tokens.len()))]
pub fn parse(tokens: &[TokenSpan]) -> Result<Expression, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyExpression);
    }

    let (pos, expression) = ExpressionParser.parse(tokens, 0)?;
    match tokens.get(pos) {
        None => Ok(expression),
        Some(span) if span.token == Token::Delimiter(Delimiter::CloseParen) => {
            Err(ParseError::UnbalancedDelimiter {
                delimiter: Delimiter::CloseParen.to_string(),
                position: span.start,
            })
        }
        Some(span) => Err(ParseError::TrailingInput {
            found: span.text.clone(),
            position: span.start,
        }),
    }
}

/// Lexes and parses `source` in one step.
#[tracing::instrument(level = "debug")]
pub fn parse_expression(source: &str) -> Result<Expression, ParseError> {
    let tokens = tokenize(source)?;
    parse(&tokens)
}
