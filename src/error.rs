use thiserror::Error;

/// Result alias for `pairclust`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the clustering engine, builders, and algorithms.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Requested feature columns are absent from the table.
    #[error("missing feature columns: {}", missing.join(", "))]
    Schema {
        /// Names that were requested but not found.
        missing: Vec<String>,
    },

    /// The reference cluster is absent under both orderings of its feature pair.
    #[error(
        "reference cluster {cluster_id} not found for pair ({feature1}, {feature2}); available pairs: {}",
        format_pairs(available)
    )]
    ReferenceNotFound {
        /// First feature of the requested pair.
        feature1: String,
        /// Second feature of the requested pair.
        feature2: String,
        /// Requested cluster label.
        cluster_id: i32,
        /// Feature pairs present in the collection.
        available: Vec<(String, String)>,
    },

    /// Clustering a single feature pair failed.
    #[error("clustering failed for pair ({feature1}, {feature2}): {message}")]
    Clustering {
        /// First feature of the pair.
        feature1: String,
        /// Second feature of the pair.
        feature2: String,
        /// Underlying failure.
        message: String,
    },

    /// A NaN or infinite value reached a numeric step.
    #[error("non-finite value in column '{column}'")]
    NonFinite {
        /// Offending column.
        column: String,
    },

    /// Matrix dimension mismatch.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of clusters requested.
    #[error("cannot create {requested} clusters from {n_items} items")]
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

fn format_pairs(pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return "none".to_string();
    }
    pairs
        .iter()
        .map(|(a, b)| format!("({a}, {b})"))
        .collect::<Vec<_>>()
        .join(", ")
}
