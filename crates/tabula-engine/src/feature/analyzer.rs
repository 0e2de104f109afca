//! Feature analysis
//!
//! Prepares an execution sequence for the engine: for each feature to
//! execute, pulls its definition from the registry and resolves its
//! aggregation flag. An explicit `FeatureKind` declaration wins; otherwise
//! the classifier's verdict over the body's source text is used.

use crate::feature::classifier::{AggregationClassifier, KeywordClassifier};
use crate::feature::definition::{FeatureDefinition, FeatureKind};
use crate::feature::registry::FeatureRegistry;
use std::collections::HashMap;
use tracing::{debug, warn};

/// A feature ready for execution
#[derive(Debug, Clone)]
pub struct AnalyzedFeature {
    /// The definition, including its ordered argument names and body
    pub definition: FeatureDefinition,
    /// True if this feature reduces its group to a scalar
    pub is_aggregation: bool,
}

/// Execution metadata for every feature in an execution sequence
#[derive(Debug, Clone, Default)]
pub struct ExecutionMetadata {
    features: HashMap<String, AnalyzedFeature>,
}

impl ExecutionMetadata {
    /// Get the analyzed feature by name
    pub fn get(&self, name: &str) -> Option<&AnalyzedFeature> {
        self.features.get(name)
    }

    /// True if metadata exists for this feature
    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    /// Number of analyzed features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True if no features were analyzed
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Analyzes features and prepares execution metadata
pub struct FeatureAnalyzer<'a> {
    registry: &'a FeatureRegistry,
    classifier: Box<dyn AggregationClassifier>,
}

impl<'a> FeatureAnalyzer<'a> {
    /// Create an analyzer with the default keyword classifier
    pub fn new(registry: &'a FeatureRegistry) -> Self {
        Self {
            registry,
            classifier: Box::new(KeywordClassifier::new()),
        }
    }

    /// Create an analyzer with a custom classifier
    pub fn with_classifier(
        registry: &'a FeatureRegistry,
        classifier: Box<dyn AggregationClassifier>,
    ) -> Self {
        Self {
            registry,
            classifier,
        }
    }

    /// Build execution metadata for an execution sequence
    ///
    /// Features already present as input columns are skipped (the engine
    /// will find them in the working table and never recompute them).
    /// Features absent from the registry are skipped with a warning.
    pub fn analyze(&self, exec_seq: &[String], input_columns: &[String]) -> ExecutionMetadata {
        let mut features = HashMap::new();

        for name in exec_seq {
            if input_columns.contains(name) {
                debug!("Skipping '{}' - already in input data", name);
                continue;
            }

            let Some(definition) = self.registry.get(name) else {
                warn!("Feature '{}' not found in registry - skipping", name);
                continue;
            };

            let is_aggregation = match definition.kind {
                Some(FeatureKind::Attribute) => true,
                Some(FeatureKind::Filter) => false,
                None => self.classifier.is_aggregation(definition),
            };

            debug!(
                "Analyzed feature '{}': {} args, is_aggregation={}",
                name,
                definition.arg_count(),
                is_aggregation
            );

            features.insert(
                name.clone(),
                AnalyzedFeature {
                    definition: definition.clone(),
                    is_aggregation,
                },
            );
        }

        ExecutionMetadata { features }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::Value;

    fn registry_with(defs: Vec<FeatureDefinition>) -> FeatureRegistry {
        let mut registry = FeatureRegistry::new();
        for def in defs {
            registry.register(None, def);
        }
        registry
    }

    #[test]
    fn test_analyze_uses_classifier() {
        let registry = registry_with(vec![
            FeatureDefinition::new("qty_sum", ["qty"], |_a, _c| Ok(Value::Null))
                .with_source("qty.sum()"),
            FeatureDefinition::new("total", ["qty", "price"], |_a, _c| Ok(Value::Null))
                .with_source("qty * price"),
        ]);

        let analyzer = FeatureAnalyzer::new(&registry);
        let metadata = analyzer.analyze(
            &["qty_sum".to_string(), "total".to_string()],
            &["qty".to_string(), "price".to_string()],
        );

        assert_eq!(metadata.len(), 2);
        assert!(metadata.get("qty_sum").unwrap().is_aggregation);
        assert!(!metadata.get("total").unwrap().is_aggregation);
    }

    #[test]
    fn test_explicit_kind_overrides_classifier() {
        // Source text says aggregation, declaration says filter
        let registry = registry_with(vec![FeatureDefinition::new(
            "capped",
            ["price"],
            |_a, _c| Ok(Value::Null),
        )
        .with_source("price.max(cap)")
        .with_kind(FeatureKind::Filter)]);

        let analyzer = FeatureAnalyzer::new(&registry);
        let metadata = analyzer.analyze(&["capped".to_string()], &[]);

        assert!(!metadata.get("capped").unwrap().is_aggregation);
    }

    #[test]
    fn test_input_columns_skipped() {
        let registry = registry_with(vec![FeatureDefinition::new("qty", ["x"], |_a, _c| {
            Ok(Value::Null)
        })]);

        let analyzer = FeatureAnalyzer::new(&registry);
        let metadata = analyzer.analyze(&["qty".to_string()], &["qty".to_string()]);
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_unregistered_feature_skipped() {
        let registry = FeatureRegistry::new();
        let analyzer = FeatureAnalyzer::new(&registry);
        let metadata = analyzer.analyze(&["ghost".to_string()], &[]);
        assert!(!metadata.contains("ghost"));
    }
}
