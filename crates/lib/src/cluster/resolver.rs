//! Resolver trait: turn a cluster URL into the server URL to post to.

use crate::error::OrtcError;
use async_trait::async_trait;

#[async_trait]
pub trait ClusterResolver: Send + Sync {
    /// Resolve `cluster_url` for `application_key` into a server URL.
    async fn resolve(&self, cluster_url: &str, application_key: &str) -> Result<String, OrtcError>;
}
