//! Evaluation context passed to feature bodies
//!
//! Shared constants and helper values reach feature bodies through an
//! explicit read-only context object instead of mutated global state. Every
//! body invocation receives the same `EvalContext`; bodies must not rely on
//! anything outside their arguments and this context.

use std::collections::HashMap;
use tabula_core::Value;

/// Read-only context available to every feature body invocation
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    constants: HashMap<String, Value>,
}

impl EvalContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a named constant
    pub fn with_constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }

    /// Look up a constant by name
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    /// Number of registered constants
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    /// True if no constants are registered
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}
