//! Errors surfaced by the ORTC client.

/// Failure of an ORTC client call.
#[derive(Debug, thiserror::Error)]
pub enum OrtcError {
    /// Caller input rejected before any network activity.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// Transport fault from the HTTP client, passed through unchanged.
    #[error("ortc request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The cluster balancer did not yield a usable server.
    #[error("ortc cluster error: {0}")]
    Cluster(String),
    #[error("ortc runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}
