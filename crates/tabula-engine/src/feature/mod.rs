//! Feature definitions, registry, classification, and analysis

pub mod analyzer;
pub mod classifier;
pub mod definition;
pub mod registry;

pub use analyzer::{AnalyzedFeature, ExecutionMetadata, FeatureAnalyzer};
pub use classifier::{AggregationClassifier, KeywordClassifier, AGGREGATION_KEYWORDS};
pub use definition::{FeatureDefinition, FeatureFn, FeatureKind};
pub use registry::{FeatureRegistry, COMMON_NAMESPACE};
