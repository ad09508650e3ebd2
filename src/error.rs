//! Error types for hyperwalk.

use thiserror::Error;

/// Error type for embedding training operations.
///
/// Numerical domain issues inside the geometry kernel (out-of-domain
/// `acosh` arguments, near-zero tangent norms) are clamped at the call
/// site and deliberately have no variant here: they occur routinely at
/// the manifold boundary and must not abort training.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration, detected before training starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The graph has no nodes.
    #[error("graph is empty")]
    EmptyGraph,

    /// Walk extraction produced no positive pairs to train on.
    #[error("no positive samples: walks produced no co-occurring pairs")]
    NoPositiveSamples,

    /// A discrete distribution had no probability mass.
    #[error("degenerate sampling distribution: {0}")]
    DegenerateDistribution(String),

    /// A streaming batch producer failed.
    #[error("batch worker failed: {0}")]
    Worker(String),

    /// IO error (embedding export).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for embedding training operations.
pub type Result<T> = std::result::Result<T, Error>;
