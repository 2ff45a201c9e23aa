//! ORTC balancer client: GET `{cluster}?appkey=...` and read `SOCKET_SERVER` from the reply.

use crate::cluster::resolver::ClusterResolver;
use crate::config::{ClusterConfig, Config};
use crate::error::OrtcError;
use async_trait::async_trait;
use std::time::Duration;

const SOCKET_SERVER_VAR: &str = "SOCKET_SERVER";

/// Resolves cluster URLs through the ORTC balancer, retrying with a fixed delay.
#[derive(Clone)]
pub struct BalancerClient {
    client: reqwest::Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl BalancerClient {
    pub fn new(client: reqwest::Client, cluster: &ClusterConfig) -> Self {
        Self {
            client,
            max_attempts: cluster.max_attempts.max(1),
            retry_delay: cluster.retry_delay(),
        }
    }

    /// Standalone balancer with its own HTTP client, for resolving without sending.
    pub fn from_config(config: &Config) -> Result<Self, OrtcError> {
        let client = reqwest::Client::builder()
            .timeout(config.http.timeout())
            .build()?;
        Ok(Self::new(client, &config.cluster))
    }

    /// One balancer round trip. Errors are strings so every failure kind feeds the same retry path.
    async fn fetch_server(&self, cluster_url: &str, application_key: &str) -> Result<String, String> {
        let url = balancer_url(cluster_url, application_key);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("balancer returned {} {}", status, body));
        }
        let body = res.text().await.map_err(|e| e.to_string())?;
        parse_balancer_response(&body)
            .ok_or_else(|| format!("no {} in balancer response: {}", SOCKET_SERVER_VAR, body))
    }
}

#[async_trait]
impl ClusterResolver for BalancerClient {
    async fn resolve(&self, cluster_url: &str, application_key: &str) -> Result<String, OrtcError> {
        let mut last_err = String::new();
        for attempt in 1..=self.max_attempts {
            match self.fetch_server(cluster_url, application_key).await {
                Ok(server) => {
                    log::debug!("ortc balancer resolved {} -> {}", cluster_url, server);
                    return Ok(server);
                }
                Err(e) => {
                    log::warn!(
                        "ortc balancer attempt {}/{} failed: {}",
                        attempt,
                        self.max_attempts,
                        e
                    );
                    last_err = e;
                }
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        Err(OrtcError::Cluster(format!(
            "unable to get a server from {} after {} attempts: {}",
            cluster_url, self.max_attempts, last_err
        )))
    }
}

fn balancer_url(cluster_url: &str, application_key: &str) -> String {
    let sep = if cluster_url.contains('?') { '&' } else { '?' };
    let key: String = url::form_urlencoded::byte_serialize(application_key.as_bytes()).collect();
    format!("{}{}appkey={}", cluster_url, sep, key)
}

/// Extract the server URL from a balancer reply such as `var SOCKET_SERVER = "https://host";`.
pub fn parse_balancer_response(body: &str) -> Option<String> {
    let start = body.find(SOCKET_SERVER_VAR)? + SOCKET_SERVER_VAR.len();
    let rest = body[start..].trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = &rest[1..];
    let end = inner.find(quote)?;
    let server = inner[..end].trim();
    if server.is_empty() {
        None
    } else {
        Some(server.to_string())
    }
}
