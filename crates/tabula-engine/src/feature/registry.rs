//! Feature Registry Module
//!
//! In-memory store of feature definitions, scoped by an optional namespace.
//! Lookup checks the namespaced key first and falls back to the shared
//! `common` namespace, so models can override common features with their
//! own definition of the same name. The registry has no ordering semantics;
//! execution order is entirely the resolver's responsibility.

use crate::feature::definition::FeatureDefinition;
use std::collections::HashMap;
use tracing::debug;

/// Namespace for features shared across all models
pub const COMMON_NAMESPACE: &str = "common";

/// Feature registry that manages feature definitions
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    /// All registered features indexed by (namespace, name)
    features: HashMap<(String, String), FeatureDefinition>,

    /// Namespace used for unqualified lookups; `None` means common only
    namespace: Option<String>,
}

impl FeatureRegistry {
    /// Create a new empty feature registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the active namespace used by `get` and `contains`
    pub fn set_namespace(&mut self, namespace: Option<impl Into<String>>) {
        self.namespace = namespace.map(Into::into);
        debug!("Active namespace: {:?}", self.namespace);
    }

    /// The currently active namespace
    pub fn active_namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Register a feature definition, overwriting any previous definition
    /// under the same `(namespace, name)` key
    ///
    /// `None` registers into the common namespace. Argument names are not
    /// validated against any schema.
    pub fn register(&mut self, namespace: Option<&str>, def: FeatureDefinition) {
        let ns = namespace.unwrap_or(COMMON_NAMESPACE).to_string();
        debug!("Registered feature '{}:{}'", ns, def.name);
        self.features.insert((ns, def.name.clone()), def);
    }

    /// Look up a feature under an explicit namespace, falling back to common
    pub fn lookup(&self, namespace: Option<&str>, name: &str) -> Option<&FeatureDefinition> {
        if let Some(ns) = namespace {
            if let Some(def) = self.features.get(&(ns.to_string(), name.to_string())) {
                return Some(def);
            }
        }
        self.features
            .get(&(COMMON_NAMESPACE.to_string(), name.to_string()))
    }

    /// Look up a feature under the active namespace, falling back to common
    pub fn get(&self, name: &str) -> Option<&FeatureDefinition> {
        self.lookup(self.namespace.as_deref(), name)
    }

    /// True if the name resolves under the active namespace or common
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get count of registered features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True if no features are registered
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// All registered feature names, with their namespaces
    pub fn feature_names(&self) -> Vec<(String, String)> {
        self.features.keys().cloned().collect()
    }

    /// All namespaces with at least one registered feature
    pub fn namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> =
            self.features.keys().map(|(ns, _)| ns.clone()).collect();
        namespaces.sort();
        namespaces.dedup();
        namespaces
    }

    /// Clear all registered features
    pub fn clear(&mut self) {
        self.features.clear();
        debug!("Cleared feature registry");
    }
}
