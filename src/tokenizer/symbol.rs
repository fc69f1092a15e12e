//! # Symbol Token Handling
//!
//! Operators and delimiters of the rule language.
//!
//! Symbols are parsed longest-match first so that `>=` is never read as `>`
//! followed by `=`. The tokenizer does not enforce precedence; that is the
//! job of the [`analyzer`](crate::analyzer).

use strum_macros::{AsRefStr, Display, EnumString};

use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{map, value},
    error::context,
};

use super::token::{ParserResult, Token};

/// Arithmetic and comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum Operator {
    /// Equality comparison operator (`==`)
    #[strum(serialize = "==")]
    EqualEqual,
    /// Inequality comparison operator (`!=`)
    #[strum(serialize = "!=")]
    NotEqual,
    /// Greater than comparison operator (`>`)
    #[strum(serialize = ">")]
    Greater,
    /// Greater than or equal comparison operator (`>=`)
    #[strum(serialize = ">=")]
    GreaterEqual,
    /// Less than comparison operator (`<`)
    #[strum(serialize = "<")]
    Less,
    /// Less than or equal comparison operator (`<=`)
    #[strum(serialize = "<=")]
    LessEqual,

    /// Addition operator (`+`)
    #[strum(serialize = "+")]
    Plus,
    /// Subtraction and negation operator (`-`)
    #[strum(serialize = "-")]
    Minus,
    /// Multiplication operator (`*`)
    #[strum(serialize = "*")]
    Multiply,
    /// Division operator (`/`)
    #[strum(serialize = "/")]
    Divide,
}

impl Operator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::EqualEqual
                | Operator::NotEqual
                | Operator::Greater
                | Operator::GreaterEqual
                | Operator::Less
                | Operator::LessEqual
        )
    }
}

/// Grouping and argument separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum Delimiter {
    /// Opening parenthesis (`(`) for grouping and function calls
    #[strum(serialize = "(")]
    OpenParen,
    /// Closing parenthesis (`)`) for grouping and function calls
    #[strum(serialize = ")")]
    CloseParen,
    /// Comma (`,`) for separating function arguments
    #[strum(serialize = ",")]
    Comma,
}

/// Parses an operator token from the input string.
///
/// Multi-character operators are tried first. A lone `=` or `!` does not
/// match anything here and ends up as a lexing error.
///
/// ```
/// # use kensa::tokenizer::symbol::{parse_operator, Operator};
/// # use kensa::tokenizer::token::Token;
/// let (rest, token) = parse_operator(">= 600").unwrap();
/// assert_eq!(token, Token::Operator(Operator::GreaterEqual));
/// assert_eq!(rest, " 600");
/// ```
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_operator(input: &str) -> ParserResult<Token> {
    context(
        "operator",
        map(
            alt((
                value(Operator::EqualEqual, tag("==")),
                value(Operator::NotEqual, tag("!=")),
                value(Operator::GreaterEqual, tag(">=")),
                value(Operator::LessEqual, tag("<=")),
                value(Operator::Greater, tag(">")),
                value(Operator::Less, tag("<")),
                value(Operator::Plus, tag("+")),
                value(Operator::Minus, tag("-")),
                value(Operator::Multiply, tag("*")),
                value(Operator::Divide, tag("/")),
            )),
            Token::Operator,
        ),
    )(input)
}

#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_delimiter(input: &str) -> ParserResult<Token> {
    context(
        "delimiter",
        map(
            alt((
                value(Delimiter::OpenParen, tag("(")),
                value(Delimiter::CloseParen, tag(")")),
                value(Delimiter::Comma, tag(",")),
            )),
            Token::Delimiter,
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators() {
        let test_cases = [
            ("==", Token::Operator(Operator::EqualEqual)),
            ("!=", Token::Operator(Operator::NotEqual)),
            (">=", Token::Operator(Operator::GreaterEqual)),
            ("<=", Token::Operator(Operator::LessEqual)),
            (">", Token::Operator(Operator::Greater)),
            ("<", Token::Operator(Operator::Less)),
            ("+", Token::Operator(Operator::Plus)),
            ("-", Token::Operator(Operator::Minus)),
            ("*", Token::Operator(Operator::Multiply)),
            ("/", Token::Operator(Operator::Divide)),
        ];

        for (input, expected) in test_cases.iter() {
            let (rest, token) = parse_operator(input).unwrap();
            assert_eq!(token, *expected);
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_delimiters() {
        let test_cases = [
            ("(", Token::Delimiter(Delimiter::OpenParen)),
            (")", Token::Delimiter(Delimiter::CloseParen)),
            (",", Token::Delimiter(Delimiter::Comma)),
        ];

        for (input, expected) in test_cases.iter() {
            let (rest, token) = parse_delimiter(input).unwrap();
            assert_eq!(token, *expected);
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_operator_precedence() {
        // ">="が">"として誤って解釈されないことを確認
        let (rest, token) = parse_operator(">=").unwrap();
        assert_eq!(token, Token::Operator(Operator::GreaterEqual));
        assert_eq!(rest, "");
    }

    #[test]
    fn test_single_equal_is_not_an_operator() {
        assert!(parse_operator("= 3").is_err());
        assert!(parse_operator("!x").is_err());
    }

    #[test]
    fn test_display_matches_source() {
        assert_eq!(Operator::LessEqual.to_string(), "<=");
        assert_eq!(Delimiter::Comma.to_string(), ",");
        assert!(Operator::NotEqual.is_comparison());
        assert!(!Operator::Divide.is_comparison());
    }
}
