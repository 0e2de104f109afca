//! Feature Definition Module
//!
//! A feature is a named computation over columns and previously computed
//! results. Its body is an opaque callable registered at startup; the
//! optional `source` text exists so the keyword classifier (and humans
//! reading logs) can see what the body does.

use crate::context::EvalContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tabula_core::Value;

/// Signature of a feature body
///
/// The body receives one `Value` per declared argument, in declaration
/// order, plus the shared read-only evaluation context. Row-wise invocation
/// passes one row's worth of values; scalar invocation passes whole columns
/// as `Value::Array`.
pub type FeatureFn = Arc<dyn Fn(&[Value], &EvalContext) -> anyhow::Result<Value> + Send + Sync>;

/// Explicit feature kind, declared at registration
///
/// When present this overrides the keyword heuristic: `Attribute` features
/// always reduce their group to a scalar, `Filter` features never do.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Row-level computed column, one value per input row
    Filter,
    /// Group-level computed scalar, one value per group
    Attribute,
}

/// Feature definition registered with the engine
#[derive(Clone)]
pub struct FeatureDefinition {
    /// Feature name (unique identifier within its namespace)
    pub name: String,

    /// Ordered argument names; each references a raw input column, another
    /// feature, or an externally joined column
    pub args: Vec<String>,

    /// The computation body
    body: FeatureFn,

    /// Textual representation of the body, scanned by the classifier
    pub source: Option<String>,

    /// Explicit kind declaration; `None` defers to the classifier
    pub kind: Option<FeatureKind>,

    /// Human-readable description
    pub description: String,
}

impl FeatureDefinition {
    /// Create a new feature definition
    pub fn new<N, A, S, F>(name: N, args: A, body: F) -> Self
    where
        N: Into<String>,
        A: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&[Value], &EvalContext) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
            body: Arc::new(body),
            source: None,
            kind: None,
            description: String::new(),
        }
    }

    /// Builder method to attach the body's textual representation
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Builder method to declare the kind explicitly
    pub fn with_kind(mut self, kind: FeatureKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Builder method to attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Invoke the body with one value per declared argument
    pub fn invoke(&self, args: &[Value], ctx: &EvalContext) -> anyhow::Result<Value> {
        (self.body)(args, ctx)
    }

    /// Number of declared arguments
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Check if this feature depends on anything
    pub fn has_args(&self) -> bool {
        !self.args.is_empty()
    }

    /// Get a description suitable for logging
    pub fn log_description(&self) -> String {
        if self.description.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.description)
        }
    }
}

impl fmt::Debug for FeatureDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureDefinition")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("source", &self.source)
            .field("kind", &self.kind)
            .field("description", &self.description)
            .finish()
    }
}
