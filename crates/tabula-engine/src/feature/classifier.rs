//! Aggregation classification
//!
//! Decides, from a feature's textual body, whether it reduces a whole group
//! to a single scalar. The default implementation is a case-insensitive
//! substring scan over a fixed keyword set.
//!
//! This is a heuristic, not a semantic analysis: a body that happens to
//! contain a keyword without aggregating is misclassified as an attribute,
//! and a body that aggregates without matching any keyword is misclassified
//! as row-level. Declaring `FeatureKind` explicitly at registration
//! sidesteps the heuristic entirely.

use crate::feature::definition::FeatureDefinition;
use tracing::warn;

/// Keywords indicating reduction semantics in a feature body
///
/// Order-independent: classification is a boolean OR over substring tests.
pub const AGGREGATION_KEYWORDS: &[&str] = &[
    "#agg",
    "#gby",
    ".sum(",
    ".mean(",
    ".median(",
    ".min(",
    ".max(",
    ".unique(",
    ".nunique(",
    ".percentile(",
    ".count(",
    ".fold(",
    ".reduce(",
    "counter(",
];

/// Decides whether a feature reduces its group to a scalar
pub trait AggregationClassifier {
    fn is_aggregation(&self, def: &FeatureDefinition) -> bool;
}

/// Keyword-scan classifier over a feature's `source` text
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    /// Create a classifier with the default keyword set
    pub fn new() -> Self {
        Self::with_keywords(AGGREGATION_KEYWORDS.iter().map(|k| k.to_string()))
    }

    /// Create a classifier with a custom keyword set
    pub fn with_keywords(keywords: impl IntoIterator<Item = String>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregationClassifier for KeywordClassifier {
    fn is_aggregation(&self, def: &FeatureDefinition) -> bool {
        let Some(source) = &def.source else {
            warn!(
                "Feature '{}' has no source text, assuming no aggregation",
                def.name
            );
            return false;
        };

        let source = source.to_lowercase();
        self.keywords.iter().any(|k| source.contains(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::Value;

    fn feature_with_source(source: &str) -> FeatureDefinition {
        FeatureDefinition::new("f", ["x"], |_args, _ctx| Ok(Value::Null)).with_source(source)
    }

    #[test]
    fn test_detects_aggregation_keywords() {
        let classifier = KeywordClassifier::new();

        assert!(classifier.is_aggregation(&feature_with_source("qty.sum()")));
        assert!(classifier.is_aggregation(&feature_with_source("values.mean() / count")));
        assert!(classifier.is_aggregation(&feature_with_source("ids.nunique()")));
        assert!(classifier.is_aggregation(&feature_with_source("revenue #agg")));
    }

    #[test]
    fn test_scan_is_case_insensitive() {
        let classifier = KeywordClassifier::new();
        assert!(classifier.is_aggregation(&feature_with_source("Qty.SUM()")));
        assert!(classifier.is_aggregation(&feature_with_source("#AGG")));
    }

    #[test]
    fn test_plain_row_wise_source() {
        let classifier = KeywordClassifier::new();
        assert!(!classifier.is_aggregation(&feature_with_source("qty * price")));
        assert!(!classifier.is_aggregation(&feature_with_source("price > avg_price")));
    }

    #[test]
    fn test_missing_source_is_not_aggregation() {
        let classifier = KeywordClassifier::new();
        let feature = FeatureDefinition::new("f", ["x"], |_args, _ctx| Ok(Value::Null));
        assert!(!classifier.is_aggregation(&feature));
    }

    #[test]
    fn test_custom_keywords() {
        let classifier = KeywordClassifier::with_keywords(vec!["rollup(".to_string()]);
        assert!(classifier.is_aggregation(&feature_with_source("rollup(x)")));
        assert!(!classifier.is_aggregation(&feature_with_source("qty.sum()")));
    }

    #[test]
    fn test_known_false_positive() {
        // The scan is textual: a row-wise body mentioning `.max(` is
        // misclassified. Declaring FeatureKind::Filter avoids this.
        let classifier = KeywordClassifier::new();
        assert!(classifier.is_aggregation(&feature_with_source("a.max(b)")));
    }
}
