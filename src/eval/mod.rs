//! Kensa Evaluation System
//!
//! Walks a parsed [`Expression`](crate::ast::Expression) and computes its
//! [`Value`](crate::value::Value). Evaluation is synchronous and pure: the
//! same tree, context and registry always produce the same result.
//!
//! # Core Components
//!
//! ## Expression Evaluator
//! Recursive tree walk with scalar/sequence broadcasting for arithmetic,
//! comparison and logical operators. Function calls are dispatched to the
//! [`OperatorRegistry`](crate::registry::OperatorRegistry).
//!
//! ## Evaluation Context
//! Immutable variable bindings for one evaluation.
//!
//! # Errors
//!
//! Every failure is returned as an [`EvalError`](evaluator::EvalError).
//! A false `when` guard is reported as `EvalError::Inapplicable`, which the
//! [`classifier`](crate::classifier) keeps apart from real failures.

pub mod context;
pub mod evaluator;

pub use context::EvaluationContext;
pub use evaluator::{evaluate, EvalError, EvalResult, ExpressionEvaluator};
