//! # Rule Engine
//!
//! Entry point for host applications. A [`RuleEngine`] owns an operator
//! registry and an expression cache, and turns `(expression, context)` pairs
//! into [`EvaluationOutcome`]s. Failures of any stage are reported inside the
//! outcome rather than returned as errors.
//!
//! ```
//! use kensa::engine::RuleEngine;
//! use kensa::eval::EvaluationContext;
//!
//! let engine = RuleEngine::new();
//! let ctx = EvaluationContext::new()
//!     .with("pressure", 612.0)
//!     .with("thermocouples", vec![50.0, 52.5, 54.0]);
//!
//! let outcome = engine.evaluate("max(thermocouples) < 55 when pressure >= 600", &ctx);
//! assert_eq!(outcome.passed, Some(true));
//! ```
//!
//! The engine is `Send + Sync`; share one behind an `Arc` and evaluate from
//! as many threads as needed.

use std::sync::Arc;

use tracing::debug;

use crate::analyzer::ParseError;
use crate::ast::Expression;
use crate::cache::ExpressionCache;
use crate::classifier::{classify_as, infer_kind, EvaluationOutcome, OutcomeKind};
use crate::config::{ConfigError, EngineConfig};
use crate::eval::{evaluate, EvaluationContext};
use crate::operators::OperatorSpec;
use crate::registry::{Operator, OperatorDescriptor, OperatorRegistry};

#[derive(Debug)]
pub struct RuleEngine {
    registry: OperatorRegistry,
    cache: ExpressionCache,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    /// An engine with the generic builtins and an empty cache.
    pub fn new() -> Self {
        Self::with_registry(OperatorRegistry::with_builtins())
    }

    /// An engine sharing `registry` with any other holder of a clone of it.
    pub fn with_registry(registry: OperatorRegistry) -> Self {
        Self {
            registry,
            cache: ExpressionCache::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let registry = if config.builtins {
            OperatorRegistry::with_builtins()
        } else {
            OperatorRegistry::empty()
        };
        for spec in &config.operators {
            spec.register(&registry)?;
        }

        let engine = Self::with_registry(registry);
        for expression in &config.warm_expressions {
            engine
                .cache
                .get_or_parse(expression)
                .map_err(|source| ConfigError::InvalidExpression {
                    expression: expression.clone(),
                    source,
                })?;
        }
        debug!(
            operators = engine.registry.len(),
            cached = engine.cache.len(),
            "rule engine configured"
        );
        Ok(engine)
    }

    pub fn register_operator(
        &self,
        name: impl Into<String>,
        min_arity: usize,
        max_arity: Option<usize>,
        implementation: impl Operator + 'static,
    ) -> Option<Arc<OperatorDescriptor>> {
        self.registry
            .register(name, min_arity, max_arity, implementation)
    }

    pub fn register_spec(&self, spec: &OperatorSpec) -> Result<(), ConfigError> {
        spec.register(&self.registry)
    }

    /// Parses through the cache.
    pub fn parse(&self, source: &str) -> Result<Arc<Expression>, ParseError> {
        self.cache.get_or_parse(source)
    }

    /// Evaluates `expression`, inferring calculation vs rule from its shape.
    ///
    /// An expression that fails to parse is reported as a failed calculation.
    #[tracing::instrument(level = "debug", skip(self, ctx))]
    pub fn evaluate(&self, expression: &str, ctx: &EvaluationContext) -> EvaluationOutcome {
        match self.parse(expression) {
            Ok(ast) => self.evaluate_ast(infer_kind(&ast), &ast, ctx),
            Err(e) => EvaluationOutcome::failed(OutcomeKind::Calculation, e),
        }
    }

    /// Evaluates `expression` as the given kind regardless of its shape.
    #[tracing::instrument(level = "debug", skip(self, ctx))]
    pub fn evaluate_as(
        &self,
        kind: OutcomeKind,
        expression: &str,
        ctx: &EvaluationContext,
    ) -> EvaluationOutcome {
        match self.parse(expression) {
            Ok(ast) => self.evaluate_ast(kind, &ast, ctx),
            Err(e) => EvaluationOutcome::failed(kind, e),
        }
    }

    fn evaluate_ast(
        &self,
        kind: OutcomeKind,
        ast: &Expression,
        ctx: &EvaluationContext,
    ) -> EvaluationOutcome {
        let result = evaluate(ast, ctx, &self.registry);
        let outcome = classify_as(kind, ast, result, ctx, &self.registry);
        debug!(status = %outcome.status(), "{}", outcome);
        outcome
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ExpressionCache {
        &self.cache
    }
}
