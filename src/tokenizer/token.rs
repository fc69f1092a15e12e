use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::multispace1,
    combinator::recognize,
    error::{context, VerboseError},
    sequence::pair,
    IResult,
};
use thiserror::Error;

use super::{
    keyword::Keyword,
    literal::{parse_literal, Literal},
    symbol::{parse_delimiter, parse_operator, Delimiter, Operator},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Keyword(Keyword),
    // Identifiers
    Identifier(String),
    // Symbols
    Operator(Operator),
    Delimiter(Delimiter),
    // Literals
    Literal(Literal),
}

impl Token {
    /// Whether this token can close an operand, in which case a following
    /// `-` is a binary minus rather than the sign of a literal.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Identifier(_) | Token::Literal(_) | Token::Delimiter(Delimiter::CloseParen)
        )
    }
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    current_position: usize,
    current_line: usize,
    current_column: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            current_position: 0,
            current_line: 1,   // 1-based
            current_column: 1, // 1-based
        }
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    pub fn tokenize(&mut self, input: &str) -> Result<Vec<TokenSpan>, LexError> {
        let mut tokens: Vec<TokenSpan> = Vec::new();
        let mut remaining = input;

        while !remaining.is_empty() {
            if let Ok((new_remaining, ws)) = parse_whitespace(remaining) {
                self.update_position(ws);
                remaining = new_remaining;
                continue;
            }

            let start_position = self.current_position;
            let start_line = self.current_line;
            let start_column = self.current_column;
            let signed = tokens
                .last()
                .map_or(true, |last| !last.token.ends_operand());

            let result = parse_literal(remaining, signed).or_else(|_| {
                alt((parse_operator, parse_delimiter, parse_identifier))(remaining)
            });

            match result {
                Ok((new_remaining, token)) => {
                    let consumed = &remaining[..(remaining.len() - new_remaining.len())];
                    self.update_position(consumed);

                    tokens.push(TokenSpan {
                        token,
                        text: consumed.to_string(),
                        start: start_position,
                        end: self.current_position,
                        line: start_line,
                        column: start_column,
                    });

                    remaining = new_remaining;
                }
                Err(_) => {
                    // remaining is non-empty here
                    let found = remaining.chars().next().unwrap_or_default();
                    let span = Span {
                        start: self.current_position,
                        end: self.current_position + found.len_utf8(),
                        line: self.current_line,
                        column: self.current_column,
                    };
                    let error = if found == '[' {
                        LexError::UnterminatedLiteral { span }
                    } else {
                        LexError::UnexpectedCharacter { found, span }
                    };
                    tracing::debug!("{}", error);
                    return Err(error);
                }
            }
        }

        Ok(tokens)
    }

    fn update_position(&mut self, text: &str) {
        for c in text.chars() {
            self.current_position += c.len_utf8();
            if c == '\n' {
                self.current_line += 1;
                self.current_column = 1;
            } else {
                self.current_column += 1;
            }
        }
    }
}

/// Tokenizes `input` with a fresh [`Tokenizer`].
pub fn tokenize(input: &str) -> Result<Vec<TokenSpan>, LexError> {
    Tokenizer::new().tokenize(input)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line: {}, column: {}, start: {}, end: {}",
            self.line, self.column, self.start, self.end
        )
    }
}

fn parse_whitespace(input: &str) -> ParserResult<&str> {
    context("whitespace", multispace1)(input)
}

/// Identifiers, keywords and the boolean literals `true`/`false`.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_identifier(input: &str) -> ParserResult<Token> {
    let (input, id) = context(
        "identifier",
        recognize(pair(
            take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        )),
    )(input)?;

    if let Ok(kw) = Keyword::from_str(id) {
        return Ok((input, Token::Keyword(kw)));
    }
    match id {
        "true" => Ok((input, Token::Literal(Literal::Boolean(true)))),
        "false" => Ok((input, Token::Literal(Literal::Boolean(false)))),
        _ => Ok((input, Token::Identifier(id.to_string()))),
    }
}

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{found}' at {span}")]
    UnexpectedCharacter { found: char, span: Span },
    #[error("unterminated literal at {span}")]
    UnterminatedLiteral { span: Span },
}

impl LexError {
    /// Byte offset of the offending character.
    pub fn position(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { span, .. } | LexError::UnterminatedLiteral { span } => {
                span.start
            }
        }
    }
}
