//! Parsed-expression cache keyed by source text.
//!
//! Rules are re-evaluated against every new batch of telemetry, so parsing
//! happens once per distinct source string. Entries are never evicted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::analyzer::{parse_expression, ParseError};
use crate::ast::Expression;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct ExpressionCache {
    entries: DashMap<String, Arc<Expression>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached tree for `source`, parsing it on first use.
    ///
    /// A miss parses while holding the entry's shard lock, so concurrent
    /// callers asking for the same new source parse it only once. Failed
    /// parses are returned to the caller and not stored.
    pub fn get_or_parse(&self, source: &str) -> Result<Arc<Expression>, ParseError> {
        if let Some(entry) = self.entries.get(source) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(entry.value()));
        }

        // another caller may have inserted it since the lookup above
        let mut parsed = false;
        let entry = self
            .entries
            .entry(source.to_string())
            .or_try_insert_with(|| {
                parsed = true;
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("cache miss, parsing '{}'", source);
                parse_expression(source).map(Arc::new)
            })?;
        if !parsed {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(Arc::clone(entry.value()))
    }

    pub fn get(&self, source: &str) -> Option<Arc<Expression>> {
        self.entries.get(source).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
