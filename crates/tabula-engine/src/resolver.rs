//! Dependency resolution
//!
//! Walks the dependency tree of the requested output features depth-first
//! and produces an `ExecutionPlan`: the raw input columns the run needs and
//! a topologically ordered execution sequence. Resolution is deliberately
//! permissive about unknown names - a dependency that is neither an
//! available column nor a registered feature is assumed to be an
//! expected-but-missing input column, deferring failure to execution time
//! where the richer `UnresolvedArgument` diagnostic applies.

use crate::error::{EngineError, Result};
use crate::feature::FeatureRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Columns contributed by externally joined datasets
///
/// External columns are merged into the input (prefixed with their source
/// name) before the engine runs; the resolver only records which resolved
/// input columns originate from a join. The flat `full_names` list exists
/// for membership tests during execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalColumns {
    /// Source name to the column names it contributes, prefix stripped
    pub by_source: HashMap<String, Vec<String>>,
    /// Full (prefixed) column names
    pub full_names: Vec<String>,
}

impl ExternalColumns {
    /// True if this column name came from an external join
    pub fn contains(&self, name: &str) -> bool {
        self.full_names.iter().any(|n| n == name)
    }

    /// True if no external columns were identified
    pub fn is_empty(&self) -> bool {
        self.full_names.is_empty()
    }
}

/// Output of dependency resolution
///
/// Invariants: `exec_seq` is a topological order (every feature appears
/// after all features it depends on); `input_cols` contains no registered
/// feature; the two lists are disjoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Raw columns required from the input data, first-visit order
    pub input_cols: Vec<String>,
    /// Features to execute, in dependency order
    pub exec_seq: Vec<String>,
    /// Which input columns originate from external joins
    pub external: ExternalColumns,
}

/// Resolves feature dependencies using DFS
pub struct DependencyResolver<'a> {
    registry: &'a FeatureRegistry,
}

impl<'a> DependencyResolver<'a> {
    /// Create a resolver over a registry
    pub fn new(registry: &'a FeatureRegistry) -> Self {
        Self { registry }
    }

    /// Resolve all dependencies for the requested output features
    ///
    /// `group_by` columns are supplied by the grouping operation: they are
    /// never recursed into and never treated as computable features.
    /// `external_sources` names the joined datasets whose prefixed columns
    /// should be recorded in the plan's `ExternalColumns`.
    pub fn resolve(
        &self,
        outputs: &[String],
        available_cols: &[String],
        group_by: &[String],
        external_sources: &[String],
    ) -> Result<ExecutionPlan> {
        let available: HashSet<&str> = available_cols.iter().map(String::as_str).collect();

        let mut input_cols = Vec::new();
        let mut exec_seq = Vec::new();
        let mut path = Vec::new();

        for feature in outputs {
            self.resolve_feature(
                feature,
                &available,
                group_by,
                &mut input_cols,
                &mut exec_seq,
                &mut path,
                0,
            )?;
        }

        let external = Self::extract_external_columns(&input_cols, external_sources);

        info!(
            "Dependency resolution complete: {} input columns, {} execution steps",
            input_cols.len(),
            exec_seq.len()
        );
        debug!("  Input columns: {:?}", input_cols);
        debug!("  Execution sequence: {:?}", exec_seq);
        if !external.is_empty() {
            info!(
                "  External columns requested: {} across {} sources",
                external.full_names.len(),
                external.by_source.len()
            );
        }

        Ok(ExecutionPlan {
            input_cols,
            exec_seq,
            external,
        })
    }

    /// Recursively resolve a single feature (DFS)
    #[allow(clippy::too_many_arguments)]
    fn resolve_feature(
        &self,
        feature: &str,
        available: &HashSet<&str>,
        group_by: &[String],
        input_cols: &mut Vec<String>,
        exec_seq: &mut Vec<String>,
        path: &mut Vec<String>,
        depth: usize,
    ) -> Result<()> {
        debug!("{}Resolving '{}' (depth={})", "  ".repeat(depth), feature, depth);

        // Base case: an available column in the input data
        if available.contains(feature) {
            if !input_cols.iter().any(|c| c == feature) {
                input_cols.push(feature.to_string());
                debug!("Added available column '{}' to input list", feature);
            }
            return Ok(());
        }

        // Base case: unknown and unregistered - assume it is an input
        // column and let execution-time lookup report it if absent
        if !self.registry.contains(feature) {
            if !input_cols.iter().any(|c| c == feature) {
                warn!(
                    "Feature '{}' is not registered, assuming input column",
                    feature
                );
                input_cols.push(feature.to_string());
            }
            return Ok(());
        }

        if path.iter().any(|p| p == feature) {
            let mut cycle = path.clone();
            cycle.push(feature.to_string());
            return Err(EngineError::CircularDependency(cycle.join(" -> ")));
        }

        // Recursive case: resolve each argument, skipping group-by columns
        // (they are provided by the grouping operation)
        let Some(def) = self.registry.get(feature) else {
            return Ok(());
        };
        let args = def.args.clone();
        debug!("Feature '{}' has {} dependencies: {:?}", feature, args.len(), args);

        path.push(feature.to_string());
        for arg in &args {
            if group_by.iter().any(|g| g == arg) {
                continue;
            }
            self.resolve_feature(
                arg,
                available,
                group_by,
                input_cols,
                exec_seq,
                path,
                depth + 1,
            )?;
        }
        path.pop();

        if !exec_seq.iter().any(|f| f == feature) {
            exec_seq.push(feature.to_string());
            debug!("Added '{}' to execution sequence", feature);
        }

        Ok(())
    }

    /// Record which resolved input columns come from external joins
    ///
    /// A column belongs to source `s` when its name starts with `s_`; the
    /// stripped remainder is the column's name in the external dataset.
    fn extract_external_columns(
        input_cols: &[String],
        external_sources: &[String],
    ) -> ExternalColumns {
        let mut external = ExternalColumns::default();

        for source in external_sources {
            let prefix = format!("{}_", source);
            let matching: Vec<&String> = input_cols
                .iter()
                .filter(|c| c.starts_with(&prefix))
                .collect();

            if matching.is_empty() {
                continue;
            }

            let stripped: Vec<String> = matching
                .iter()
                .map(|c| c[prefix.len()..].to_string())
                .collect();
            debug!(
                "Found {} columns from external source '{}': {:?}",
                stripped.len(),
                source,
                stripped
            );

            external
                .full_names
                .extend(matching.into_iter().cloned());
            external.by_source.insert(source.clone(), stripped);
        }

        external
    }
}
