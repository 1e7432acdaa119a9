use thiserror::Error;

/// Failures inside one spreading-activation unit of work.
///
/// The engine logs these and moves on; a failing keyword never takes the
/// rest of its batch down with it.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("graph query failed for '{keyword}': {source}")]
    Graph {
        keyword: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("distributed cache error for '{key}': {source}")]
    Cache {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("activation codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("priming deadline exceeded")]
    DeadlineExceeded,
}

/// Persistence failures of the signifier tracker. Always surfaced.
#[derive(Debug, Error)]
pub enum SignifierError {
    #[error("signifier store error: {0}")]
    Store(#[from] anyhow::Error),
}
