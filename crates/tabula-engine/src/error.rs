//! Engine error types

use thiserror::Error;

/// Engine error
#[derive(Error, Debug)]
pub enum EngineError {
    /// An argument could not be found in any of the three sources searched
    /// during group execution. The searched namespaces' contents are carried
    /// so a misconfigured feature or missing input column can be diagnosed.
    #[error(
        "Feature '{feature}': argument '{argument}' not found \
         (row columns: [{row_columns}]; scalar results: [{scalar_results}]; \
         external columns: [{external_columns}])"
    )]
    UnresolvedArgument {
        feature: String,
        argument: String,
        row_columns: String,
        scalar_results: String,
        external_columns: String,
    },

    /// A user-supplied feature body failed. Never retried.
    #[error("Feature '{feature}' failed with {arg_count} args ({arg_sources}): {source}")]
    Calculation {
        feature: String,
        arg_count: usize,
        arg_sources: String,
        #[source]
        source: anyhow::Error,
    },

    /// Feature dependencies form a cycle; no execution order exists.
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    /// Core table/value error
    #[error(transparent)]
    Core(#[from] tabula_core::CoreError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
