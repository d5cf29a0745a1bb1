//! Error types for stargraph.

use thiserror::Error;

/// Error type for graph, feature and recommender operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration detected at construction time.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Feature group name that is not one of behavior/content/relation/attribute.
    #[error("unknown feature type: {0}")]
    UnknownFeatureType(String),

    /// Similarity name that is not one of jaccard/cosine/linear.
    #[error("unknown similarity: {0}")]
    UnknownSimilarity(String),

    /// Entity type name outside the known kinds.
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),

    /// A requested feature group has no data source.
    #[error("missing feature data: {0}")]
    MissingFeatureData(String),

    /// Matrix shapes do not line up.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// An iterative solve hit its step cap under the abort policy.
    #[error("{quantity} did not converge in {steps} step(s) (delta={delta})")]
    NotConverged {
        quantity: String,
        steps: usize,
        delta: f64,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
