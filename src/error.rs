//! Error taxonomy for the field engine.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors raised by topology construction and field operations.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Invalid topology or numeric parameters. Raised at construction time.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("amount {amount} at node {node} must be finite and non-negative")]
    NegativeAmount { node: usize, amount: f64 },

    #[error("node {node} out of range for topology with {count} nodes")]
    NodeOutOfRange { node: usize, count: usize },

    /// Directional queries need per-edge geometry, which only lattices carry.
    #[error("topology has no embedded geometry")]
    NotEmbedded,

    #[error("operation requires a cubic lattice topology")]
    NotCubicLattice,

    #[error("buffer holds {got} values but {needed} are required")]
    BufferTooSmall { needed: usize, got: usize },

    #[error("malformed configuration: {0}")]
    MalformedConfig(#[from] serde_json::Error),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl FieldError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        FieldError::Configuration(message.into())
    }
}
