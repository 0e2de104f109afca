//! TABULA Engine - Feature resolution and execution for tabular data
//!
//! This crate turns declared, named computations ("features") into derived
//! columns over transactional input:
//! - a registry stores feature definitions with namespace-scoped lookup
//! - a resolver walks feature dependencies depth-first and produces the raw
//!   input columns a run needs plus a topologically ordered execution
//!   sequence
//! - a classifier decides, from a feature's textual body, whether it reduces
//!   a group to a scalar
//! - an execution engine runs the sequence once per group, appending
//!   row-level results ("filters") as columns and collecting group-level
//!   results ("attributes") as scalars - including filters that read
//!   attributes computed earlier in the same pass

pub mod calculator;
pub mod context;
pub mod engine;
pub mod error;
pub mod feature;
pub mod resolver;

// Re-export main types
pub use calculator::{ArgSource, ArgValue, Calculator};
pub use context::EvalContext;
pub use engine::{ExecutionOutput, GroupExecutionEngine};
pub use error::{EngineError, Result};
pub use feature::{
    AggregationClassifier, ExecutionMetadata, FeatureAnalyzer, FeatureDefinition, FeatureKind,
    FeatureRegistry, KeywordClassifier, AGGREGATION_KEYWORDS,
};
pub use resolver::{DependencyResolver, ExecutionPlan, ExternalColumns};
