//! # Operator Registry
//!
//! Name → implementation map for every function callable from an
//! expression. Comparison and logical operators are part of the grammar and
//! never live here.
//!
//! The registry is cheap to clone and all clones share the same table, so
//! an operator registered through one handle is visible to every engine
//! holding another. The lock is only held long enough to clone the resolved
//! descriptor; operators run without it.
//!
//! ```
//! use kensa::eval::EvalResult;
//! use kensa::registry::OperatorRegistry;
//! use kensa::value::Value;
//!
//! let registry = OperatorRegistry::with_builtins();
//! registry.register("double", 1, Some(1), |args: &[Value]| -> EvalResult<Value> {
//!     match &args[0] {
//!         Value::Scalar(x) => Ok(Value::Scalar(x * 2.0)),
//!         other => Ok(other.clone()),
//!     }
//! });
//! assert!(registry.contains("double"));
//! assert!(registry.contains("max"));
//! ```

pub mod builtins;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::eval::evaluator::{EvalError, EvalResult};
use crate::value::Value;

/// A callable operator. Implemented for any suitable closure or function.
pub trait Operator: Send + Sync {
    fn call(&self, args: &[Value]) -> EvalResult<Value>;
}

impl<F> Operator for F
where
    F: Fn(&[Value]) -> EvalResult<Value> + Send + Sync,
{
    fn call(&self, args: &[Value]) -> EvalResult<Value> {
        self(args)
    }
}

/// A registered operator with its accepted arity.
#[derive(Clone)]
pub struct OperatorDescriptor {
    pub name: String,
    pub min_arity: usize,
    /// `None` for variadic operators.
    pub max_arity: Option<usize>,
    implementation: Arc<dyn Operator>,
}

impl fmt::Debug for OperatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorDescriptor")
            .field("name", &self.name)
            .field("min_arity", &self.min_arity)
            .field("max_arity", &self.max_arity)
            .finish_non_exhaustive()
    }
}

impl OperatorDescriptor {
    pub fn new(
        name: impl Into<String>,
        min_arity: usize,
        max_arity: Option<usize>,
        implementation: impl Operator + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            min_arity,
            max_arity,
            implementation: Arc::new(implementation),
        }
    }

    /// Human readable arity, e.g. `1`, `1 to 2` or `at least 1`.
    pub fn arity(&self) -> String {
        match self.max_arity {
            Some(max) if max == self.min_arity => max.to_string(),
            Some(max) => format!("{} to {}", self.min_arity, max),
            None => format!("at least {}", self.min_arity),
        }
    }

    pub fn check_arity(&self, found: usize) -> EvalResult<()> {
        let too_many = self.max_arity.is_some_and(|max| found > max);
        if found < self.min_arity || too_many {
            return Err(EvalError::ArityMismatch {
                name: self.name.clone(),
                expected: self.arity(),
                found,
            });
        }
        Ok(())
    }

    /// Checks the arity, then invokes the implementation.
    pub fn call(&self, args: &[Value]) -> EvalResult<Value> {
        self.check_arity(args.len())?;
        self.implementation.call(args)
    }
}

#[derive(Clone)]
pub struct OperatorRegistry {
    operators: Arc<RwLock<HashMap<String, Arc<OperatorDescriptor>>>>,
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("operators", &self.names())
            .finish()
    }
}

impl OperatorRegistry {
    /// A registry with no operators at all.
    pub fn empty() -> Self {
        Self {
            operators: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// A registry seeded with the generic [`builtins`].
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        builtins::register_builtins(&registry);
        registry
    }

    /// Registers `implementation` under `name`, replacing any operator of the
    /// same name. Returns the replaced descriptor.
    pub fn register(
        &self,
        name: impl Into<String>,
        min_arity: usize,
        max_arity: Option<usize>,
        implementation: impl Operator + 'static,
    ) -> Option<Arc<OperatorDescriptor>> {
        self.register_descriptor(OperatorDescriptor::new(
            name,
            min_arity,
            max_arity,
            implementation,
        ))
    }

    pub fn register_descriptor(
        &self,
        descriptor: OperatorDescriptor,
    ) -> Option<Arc<OperatorDescriptor>> {
        let name = descriptor.name.clone();
        let previous = self
            .operators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), Arc::new(descriptor));
        if previous.is_some() {
            warn!("operator '{}' re-registered, previous implementation replaced", name);
        } else {
            debug!("operator '{}' registered", name);
        }
        previous
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<OperatorDescriptor>> {
        self.operators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .operators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.operators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
