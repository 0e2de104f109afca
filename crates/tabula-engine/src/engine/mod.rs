//! Group execution engine
//!
//! Runs a resolved execution sequence exactly once per group (or once over
//! the whole dataset when no group-by is given), classifying every computed
//! feature into a row-level FILTER column or a group-level ATTRIBUTE scalar.
//!
//! Classification is decided per feature while its arguments are resolved:
//! `in_flg` records whether any argument came from the group's working
//! table, `out_flg` whether any came from previously computed scalars or
//! externally joined columns. A non-aggregating feature with `in_flg` set
//! is a FILTER; everything else is an ATTRIBUTE. Because the loop is
//! single-pass per group, a filter may read an attribute computed earlier
//! in the same pass ("filters that depend on attributes").

use crate::calculator::{ArgSource, ArgValue, Calculator};
use crate::context::EvalContext;
use crate::error::{EngineError, Result};
use crate::feature::{AnalyzedFeature, ExecutionMetadata};
use crate::resolver::ExecutionPlan;
use std::collections::BTreeMap;
use tabula_core::{GroupKey, Table, Value};
use tracing::{debug, info, warn};

/// Final outputs of one engine run
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutput {
    /// Row-level results: original rows across all groups plus appended
    /// filter columns, group key re-attached
    pub filters: Table,
    /// Group-level results: one row per group (group key + scalar columns).
    /// Always empty in enrichment mode.
    pub attrs: Table,
    /// Execution-sequence features that ended up as filter columns
    pub filter_names: Vec<String>,
    /// Execution-sequence features that ended up as attribute scalars
    pub attr_names: Vec<String>,
    /// Aggregation features skipped because no group boundary existed
    pub skipped_aggregations: Vec<String>,
}

/// Transient per-group state: the group's rows plus row-level results
/// appended so far, and group-level scalars in computation order
struct GroupWorkingState {
    row_table: Table,
    scalars: Vec<(String, Value)>,
}

impl GroupWorkingState {
    fn new(row_table: Table) -> Self {
        Self {
            row_table,
            scalars: Vec::new(),
        }
    }

    fn scalar(&self, name: &str) -> Option<&Value> {
        self.scalars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    fn scalar_names(&self) -> Vec<String> {
        self.scalars.iter().map(|(n, _)| n.clone()).collect()
    }
}

/// Executes a resolved plan over grouped input data
#[derive(Debug, Default)]
pub struct GroupExecutionEngine {
    calculator: Calculator,
    context: EvalContext,
}

impl GroupExecutionEngine {
    /// Create an engine with an empty evaluation context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine whose feature bodies see the given context
    pub fn with_context(context: EvalContext) -> Self {
        Self {
            calculator: Calculator::new(),
            context,
        }
    }

    /// Execute the plan over the input data
    ///
    /// With a non-empty `group_by`, rows are partitioned by key (groups
    /// iterate in ascending key order) and the execution sequence runs once
    /// per group. With an empty `group_by` the whole dataset is processed
    /// in enrichment mode: aggregation features are skipped with a warning
    /// and everything else runs row-wise.
    pub fn execute(
        &self,
        data_in: &Table,
        plan: &ExecutionPlan,
        metadata: &ExecutionMetadata,
        group_by: &[String],
    ) -> Result<ExecutionOutput> {
        if group_by.is_empty() {
            info!("No group-by specified - enrichment mode (filters only)");
            return self.enrich(data_in, plan, metadata);
        }

        info!(
            "Processing {} rows grouped by {:?}, {} execution steps",
            data_in.len(),
            group_by,
            plan.exec_seq.len()
        );

        let groups = split_groups(data_in, group_by)?;
        info!("Processing {} groups", groups.len());

        let mut results: Vec<(GroupKey, GroupWorkingState)> = Vec::with_capacity(groups.len());
        for (key, group_table) in groups {
            let state = self.process_group(group_table, plan, metadata)?;
            results.push((key, state));
        }

        // Re-attach group key columns to every row of every group
        for (key, state) in &mut results {
            for (i, col) in group_by.iter().enumerate() {
                state
                    .row_table
                    .insert_broadcast(col.clone(), key.values()[i].clone())?;
            }
        }

        let row_tables: Vec<Table> = results
            .iter()
            .map(|(_, state)| state.row_table.clone())
            .collect();
        let filters = Table::concat(&row_tables);

        let attrs = build_attrs_table(&results, group_by)?;

        let mut output = ExecutionOutput {
            filters,
            attrs,
            ..Default::default()
        };
        classify_landed(&mut output, &plan.exec_seq);

        info!(
            "Execution complete: {} filter rows, {} attribute rows",
            output.filters.len(),
            output.attrs.len()
        );

        Ok(output)
    }

    /// Run the execution sequence once for a single group
    ///
    /// This is the single loop that lets filters use attributes: scalars
    /// computed by earlier steps are visible to later steps of the same
    /// pass.
    fn process_group(
        &self,
        group_table: Table,
        plan: &ExecutionPlan,
        metadata: &ExecutionMetadata,
    ) -> Result<GroupWorkingState> {
        let mut state = GroupWorkingState::new(group_table);

        for feature in &plan.exec_seq {
            // Already a column, from input or a prior step - never recompute
            if state.row_table.contains_column(feature) {
                debug!("Skipping '{}' - already in working table", feature);
                continue;
            }

            let Some(analyzed) = metadata.get(feature) else {
                warn!("Feature '{}' has no execution metadata - skipping", feature);
                continue;
            };

            let (args_data, in_flg, out_flg) = self.resolve_args(feature, analyzed, plan, &state)?;

            debug!(
                "Feature '{}': in_flg={}, out_flg={}, is_aggregation={}",
                feature, in_flg, out_flg, analyzed.is_aggregation
            );

            if in_flg && !analyzed.is_aggregation {
                // FILTER: row columns in, one value per row out. When
                // out_flg is also set this is a filter reading attributes
                // computed earlier in this same pass.
                debug!(
                    "-> FILTER: {}{}",
                    feature,
                    if out_flg { " (uses attributes)" } else { "" }
                );
                let values =
                    self.calculator
                        .calculate_row_wise(&analyzed.definition, &args_data, &self.context)?;
                state.row_table.insert_column(feature.clone(), values)?;
            } else {
                // ATTRIBUTE: either a true aggregation, or a composition of
                // previously computed scalars
                debug!(
                    "-> ATTRIBUTE: {} ({})",
                    feature,
                    if analyzed.is_aggregation {
                        "aggregation"
                    } else {
                        "composition"
                    }
                );
                let value =
                    self.calculator
                        .calculate_scalar(&analyzed.definition, &args_data, &self.context)?;
                state.scalars.push((feature.clone(), value));
            }
        }

        Ok(state)
    }

    /// Resolve a feature's arguments against the three sources, in fixed
    /// priority: previously computed scalars, externally joined columns
    /// (broadcast from the group's first row), then working-table columns
    fn resolve_args(
        &self,
        feature: &str,
        analyzed: &AnalyzedFeature,
        plan: &ExecutionPlan,
        state: &GroupWorkingState,
    ) -> Result<(Vec<ArgValue>, bool, bool)> {
        let mut args_data = Vec::with_capacity(analyzed.definition.args.len());
        let mut in_flg = false;
        let mut out_flg = false;

        for arg in &analyzed.definition.args {
            if let Some(value) = state.scalar(arg) {
                out_flg = true;
                args_data.push(ArgValue::scalar(value.clone(), ArgSource::ScalarResult));
                debug!("  arg '{}' from scalar results", arg);
            } else if plan.external.contains(arg) {
                out_flg = true;
                let value = state
                    .row_table
                    .value(arg, 0)
                    .cloned()
                    .unwrap_or(Value::Null);
                args_data.push(ArgValue::scalar(value, ArgSource::External));
                debug!("  arg '{}' from external data", arg);
            } else if let Some(col) = state.row_table.column(arg) {
                in_flg = true;
                args_data.push(ArgValue::column(col.to_vec()));
                debug!("  arg '{}' from working table", arg);
            } else {
                return Err(EngineError::UnresolvedArgument {
                    feature: feature.to_string(),
                    argument: arg.clone(),
                    row_columns: state.row_table.column_names().join(", "),
                    scalar_results: state.scalar_names().join(", "),
                    external_columns: plan.external.full_names.join(", "),
                });
            }
        }

        Ok((args_data, in_flg, out_flg))
    }

    /// Process the whole dataset as one implicit group, filters only
    fn enrich(
        &self,
        data_in: &Table,
        plan: &ExecutionPlan,
        metadata: &ExecutionMetadata,
    ) -> Result<ExecutionOutput> {
        let mut enriched = data_in.clone();
        let mut skipped = Vec::new();

        for feature in &plan.exec_seq {
            if enriched.contains_column(feature) {
                debug!("Skipping '{}' - already in data", feature);
                continue;
            }

            let Some(analyzed) = metadata.get(feature) else {
                warn!("Feature '{}' has no execution metadata - skipping", feature);
                continue;
            };

            // No group boundary, so a scalar reduction has no meaning here
            if analyzed.is_aggregation {
                warn!(
                    "Skipping aggregation '{}' - cannot reduce without a group-by",
                    feature
                );
                skipped.push(feature.clone());
                continue;
            }

            let mut args_data = Vec::with_capacity(analyzed.definition.args.len());
            for arg in &analyzed.definition.args {
                let Some(col) = enriched.column(arg) else {
                    return Err(EngineError::UnresolvedArgument {
                        feature: feature.clone(),
                        argument: arg.clone(),
                        row_columns: enriched.column_names().join(", "),
                        scalar_results: String::new(),
                        external_columns: plan.external.full_names.join(", "),
                    });
                };
                args_data.push(ArgValue::column(col.to_vec()));
            }

            debug!("-> FILTER: {} (enrichment mode)", feature);
            let values =
                self.calculator
                    .calculate_row_wise(&analyzed.definition, &args_data, &self.context)?;
            enriched.insert_column(feature.clone(), values)?;
        }

        let mut output = ExecutionOutput {
            filters: enriched,
            attrs: Table::new(),
            skipped_aggregations: skipped,
            ..Default::default()
        };
        classify_landed(&mut output, &plan.exec_seq);

        info!(
            "Enrichment complete: {} rows, {} filter columns added, {} aggregations skipped",
            output.filters.len(),
            output.filter_names.len(),
            output.skipped_aggregations.len()
        );

        Ok(output)
    }
}

/// Partition rows by group key; groups come back in ascending key order
fn split_groups(table: &Table, group_by: &[String]) -> Result<Vec<(GroupKey, Table)>> {
    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    for row in 0..table.len() {
        let key = GroupKey::from_row(table, row, group_by)?;
        groups.entry(key).or_default().push(row);
    }

    let mut result = Vec::with_capacity(groups.len());
    for (key, indices) in groups {
        result.push((key, table.select_rows(&indices)?));
    }
    Ok(result)
}

/// Build the attributes table: one row per group, group key columns first,
/// then scalar columns in first-appearance order across groups
fn build_attrs_table(
    results: &[(GroupKey, GroupWorkingState)],
    group_by: &[String],
) -> Result<Table> {
    let mut scalar_names: Vec<String> = Vec::new();
    for (_, state) in results {
        for (name, _) in &state.scalars {
            if !scalar_names.contains(name) {
                scalar_names.push(name.clone());
            }
        }
    }

    let mut attrs = Table::new();
    for (i, col) in group_by.iter().enumerate() {
        let values: Vec<Value> = results
            .iter()
            .map(|(key, _)| key.values()[i].clone())
            .collect();
        attrs.insert_column(col.clone(), values)?;
    }
    for name in &scalar_names {
        let values: Vec<Value> = results
            .iter()
            .map(|(_, state)| state.scalar(name).cloned().unwrap_or(Value::Null))
            .collect();
        attrs.insert_column(name.clone(), values)?;
    }

    Ok(attrs)
}

/// Report which execution-sequence names ended up as filters vs attributes,
/// by inspecting which table each landed in after execution
fn classify_landed(output: &mut ExecutionOutput, exec_seq: &[String]) {
    for feature in exec_seq {
        if output.attrs.contains_column(feature) {
            output.attr_names.push(feature.clone());
        } else if output.filters.contains_column(feature) {
            output.filter_names.push(feature.clone());
        }
    }
}
