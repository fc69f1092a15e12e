//! # Kensa: expression and compliance rule engine
//!
//! Kensa evaluates small formulas over named telemetry values. A formula is
//! either a *calculation* (`avg(thermocouples) * 1.8 + 32`) or a *rule*
//! whose root is a comparison (`max(thermocouples) < 55 when pressure >= 600`).
//! Values are scalars, booleans, or sequences of samples; arithmetic and
//! comparisons broadcast scalars across sequences.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source → Tokenizer → Analyzer → (ExpressionCache) → Evaluator → Classifier → Outcome
//! ```
//!
//! - [`tokenizer`]: lexes the source into positioned tokens.
//! - [`analyzer`]: precedence-climbing parser producing an [`ast::Expression`].
//! - [`cache`]: parses each distinct source string once.
//! - [`eval`]: walks the tree against an [`eval::EvaluationContext`],
//!   dispatching function calls to the [`registry`].
//! - [`classifier`]: turns the raw result into an
//!   [`classifier::EvaluationOutcome`] with a rule verdict, reporting a false
//!   `when` guard as *inapplicable* rather than failed.
//!
//! [`engine::RuleEngine`] wires these together and is what most callers use.
//! Business operators with deployment parameters live in [`operators`] and
//! are usually declared through [`config::EngineConfig`].

pub mod analyzer;
pub mod ast;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod operators;
pub mod registry;
pub mod tokenizer;
pub mod value;

// Re-exports
pub use classifier::{EvaluationOutcome, OutcomeKind, OutcomeStatus};
pub use engine::RuleEngine;
pub use error::*;
pub use eval::EvaluationContext;
pub use value::Value;

#[cfg(test)]
mod tests {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[ctor::ctor]
    fn init_tests() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}
