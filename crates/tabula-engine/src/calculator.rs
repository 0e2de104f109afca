//! Feature calculation
//!
//! Applies a feature body either row-wise (one invocation per row, column
//! arguments indexed, scalar arguments broadcast) or once over whole-group
//! arrays (scalar reduction). The caller decides which shape to use; the
//! calculator never inspects classification flags.

use crate::context::EvalContext;
use crate::error::{EngineError, Result};
use crate::feature::FeatureDefinition;
use std::fmt;
use tabula_core::Value;
use tracing::debug;

/// Where an argument's value was found during group execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSource {
    /// A previously computed group-level scalar
    ScalarResult,
    /// An externally joined column, broadcast as a scalar
    External,
    /// A column of the group's working table
    RowColumn,
}

impl fmt::Display for ArgSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgSource::ScalarResult => write!(f, "scalar_result"),
            ArgSource::External => write!(f, "external"),
            ArgSource::RowColumn => write!(f, "row_column"),
        }
    }
}

/// A resolved argument value, tagged with its origin
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// A whole column, one value per row of the working table
    Column { values: Vec<Value>, source: ArgSource },
    /// A single value, broadcast row-wise or passed through scalar-wise
    Scalar { value: Value, source: ArgSource },
}

impl ArgValue {
    /// A column argument from the working table
    pub fn column(values: Vec<Value>) -> Self {
        ArgValue::Column {
            values,
            source: ArgSource::RowColumn,
        }
    }

    /// A scalar argument with an explicit origin
    pub fn scalar(value: Value, source: ArgSource) -> Self {
        ArgValue::Scalar { value, source }
    }

    /// The argument's origin
    pub fn source(&self) -> ArgSource {
        match self {
            ArgValue::Column { source, .. } => *source,
            ArgValue::Scalar { source, .. } => *source,
        }
    }
}

/// Summary of argument origins for error annotation
fn arg_sources(args: &[ArgValue]) -> String {
    args.iter()
        .map(|a| a.source().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Applies feature bodies to resolved arguments
#[derive(Debug, Clone, Copy, Default)]
pub struct Calculator;

impl Calculator {
    /// Create a new calculator
    pub fn new() -> Self {
        Self
    }

    /// Apply the body independently to every row
    ///
    /// Column arguments are indexed per row; scalar arguments are broadcast
    /// to every row. Produces exactly one output value per input row, in
    /// row order. At least one column argument is required to define the
    /// row count, and all column arguments must agree on it.
    pub fn calculate_row_wise(
        &self,
        def: &FeatureDefinition,
        args: &[ArgValue],
        ctx: &EvalContext,
    ) -> Result<Vec<Value>> {
        debug!(
            "Calculating row-wise: {} with {} args",
            def.name,
            args.len()
        );

        let mut rows: Option<usize> = None;
        for arg in args {
            if let ArgValue::Column { values, .. } = arg {
                match rows {
                    None => rows = Some(values.len()),
                    Some(expected) if values.len() != expected => {
                        return Err(self.calc_error(
                            def,
                            args,
                            anyhow::anyhow!(
                                "column arguments disagree on row count ({} vs {})",
                                expected,
                                values.len()
                            ),
                        ));
                    }
                    Some(_) => {}
                }
            }
        }
        let Some(rows) = rows else {
            return Err(self.calc_error(
                def,
                args,
                anyhow::anyhow!("row-wise calculation requires at least one column argument"),
            ));
        };

        let mut results = Vec::with_capacity(rows);
        let mut call_args = Vec::with_capacity(args.len());
        for row in 0..rows {
            call_args.clear();
            for arg in args {
                match arg {
                    ArgValue::Column { values, .. } => call_args.push(values[row].clone()),
                    ArgValue::Scalar { value, .. } => call_args.push(value.clone()),
                }
            }
            let value = def
                .invoke(&call_args, ctx)
                .map_err(|e| self.calc_error(def, args, e))?;
            results.push(value);
        }

        Ok(results)
    }

    /// Apply the body exactly once over whole-group arguments
    ///
    /// Column arguments are passed whole as `Value::Array`; scalar
    /// arguments are passed directly. The body is responsible for reducing
    /// arrays to a single value.
    pub fn calculate_scalar(
        &self,
        def: &FeatureDefinition,
        args: &[ArgValue],
        ctx: &EvalContext,
    ) -> Result<Value> {
        debug!("Calculating scalar: {} with {} args", def.name, args.len());

        let call_args: Vec<Value> = args
            .iter()
            .map(|arg| match arg {
                ArgValue::Column { values, .. } => Value::Array(values.clone()),
                ArgValue::Scalar { value, .. } => value.clone(),
            })
            .collect();

        def.invoke(&call_args, ctx)
            .map_err(|e| self.calc_error(def, args, e))
    }

    fn calc_error(
        &self,
        def: &FeatureDefinition,
        args: &[ArgValue],
        source: anyhow::Error,
    ) -> EngineError {
        EngineError::Calculation {
            feature: def.name.clone(),
            arg_count: args.len(),
            arg_sources: arg_sources(args),
            source,
        }
    }
}
