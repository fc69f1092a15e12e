//! # Tokenizer Component
//!
//! Lexical analysis for rule expressions: raw text is turned into a stream of
//! [`TokenSpan`](token::TokenSpan) values consumed by the [`analyzer`](crate::analyzer).
//!
//! ## Component Structure
//!
//! * [`token`]: Core token types, the [`Tokenizer`](token::Tokenizer) loop and [`LexError`](token::LexError)
//! * [`keyword`]: `and`, `or`, `not`, `when`
//! * [`symbol`]: Arithmetic/comparison operators and delimiters
//! * [`literal`]: Signed numbers, booleans and bracketed list literals
//!
//! ## Whitespace
//!
//! Whitespace is insignificant and never emitted as a token; it only advances
//! the position counters used for error reporting.
//!
//! ## Usage Example
//!
//! ```rust
//! use kensa::tokenizer::token::{Token, Tokenizer};
//!
//! let tokens = Tokenizer::new().tokenize("max(t) < 55 when p >= 600").unwrap();
//! assert_eq!(tokens[0].token, Token::Identifier("max".to_string()));
//! assert_eq!(tokens.len(), 10);
//! ```

pub mod keyword;
pub mod literal;
pub mod symbol;
pub mod token;

pub use token::{tokenize, LexError, Span, Token, TokenSpan, Tokenizer};
