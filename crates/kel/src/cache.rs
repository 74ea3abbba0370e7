//! Memoization of compiled expressions by expression text.
//!
//! Editors query the same expression repeatedly (validate, then complete,
//! then hover), so parse and generation results are kept in a small
//! insertion-ordered table and the oldest entry is evicted first.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use kel_ast::Node;
use kel_parser::ParseError;
use tracing::trace;

/// Typed AST of one expression plus the errors its parse recovered from.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    pub node: Node,
    pub parse_errors: Vec<ParseError>,
}

impl CompiledExpression {
    pub fn new(node: Node, parse_errors: Vec<ParseError>) -> Self {
        Self { node, parse_errors }
    }
}

#[derive(Debug)]
pub struct ExpressionCache {
    capacity: usize,
    entries: Mutex<IndexMap<String, Arc<CompiledExpression>>>,
}

impl ExpressionCache {
    /// A capacity of `0` disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(IndexMap::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Return the cached entry for `expression`, or build and store it.
    ///
    /// The lock is not held while `build` runs.
    pub fn get_or_insert_with<E>(
        &self,
        expression: &str,
        build: impl FnOnce() -> Result<CompiledExpression, E>,
    ) -> Result<Arc<CompiledExpression>, E> {
        if let Some(compiled) = self.lock().get(expression) {
            trace!(expression, "cache hit");
            return Ok(Arc::clone(compiled));
        }

        trace!(expression, "cache miss");
        let compiled = Arc::new(build()?);
        if self.capacity == 0 {
            return Ok(compiled);
        }

        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.shift_remove_index(0);
        }
        entries.insert(expression.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<String, Arc<CompiledExpression>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
