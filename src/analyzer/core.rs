use thiserror::Error;

use crate::tokenizer::LexError;

// パーサートレイト
pub trait Parser<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O>;
}

/// On success, the position of the first unconsumed token and the output.
pub type ParseResult<O> = Result<(usize, O), ParseError>;

/// Syntax errors. Positions are byte offsets into the source string.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Empty expression")]
    EmptyExpression,
    #[error("Unexpected token '{found}' at position {position}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        position: usize,
    },
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: String },
    #[error("Unbalanced delimiter '{delimiter}' at position {position}")]
    UnbalancedDelimiter { delimiter: String, position: usize },
    #[error("Trailing input '{found}' at position {position}")]
    TrailingInput { found: String, position: usize },
    #[error("Comparison operators cannot be chained, found another at position {position}")]
    ChainedComparison { position: usize },
    #[error("'when' is only allowed once at the top level, found at position {position}")]
    MisplacedGuard { position: usize },
    #[error("Expression nested deeper than {limit} levels at position {position}")]
    NestingTooDeep { limit: usize, position: usize },
}

impl ParseError {
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::Lex(e) => Some(e.position()),
            ParseError::EmptyExpression | ParseError::UnexpectedEnd { .. } => None,
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnbalancedDelimiter { position, .. }
            | ParseError::TrailingInput { position, .. }
            | ParseError::ChainedComparison { position }
            | ParseError::MisplacedGuard { position }
            | ParseError::NestingTooDeep { position, .. } => Some(*position),
        }
    }
}
