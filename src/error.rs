use thiserror::Error;

use crate::analyzer::ParseError;
use crate::config::ConfigError;
use crate::eval::evaluator::EvalError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Byte offset into the expression source, for syntax errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Parse(e) => e.position(),
            _ => None,
        }
    }
}
