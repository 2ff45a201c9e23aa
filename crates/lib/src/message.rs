//! Message client: publish a message to an ORTC channel with one form-encoded POST.
//!
//! `POST {server}/send` with body `AT=..&AK=..&PK=..&C=..&M=..`. Only `M` is URL-encoded;
//! the server answers `201 Created` when the message was accepted.

use crate::cluster::{BalancerClient, ClusterResolver};
use crate::config::Config;
use crate::error::OrtcError;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::sync::Arc;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Everything needed to publish one message.
#[derive(Debug, Clone, Default)]
pub struct SendParams {
    /// ORTC server URL, or the balancer URL when `is_cluster` is set.
    pub url: String,
    pub is_cluster: bool,
    /// Token generated by the application server, e.g. a session id.
    pub authentication_token: String,
    pub application_key: String,
    pub private_key: String,
    pub channel: String,
    pub message: String,
}

/// Async client for the ORTC `send` endpoint.
#[derive(Clone)]
pub struct MessageClient {
    client: reqwest::Client,
    resolver: Arc<dyn ClusterResolver>,
}

impl MessageClient {
    /// Build a client with the configured timeout and the ORTC balancer as cluster resolver.
    pub fn new(config: &Config) -> Result<Self, OrtcError> {
        let client = reqwest::Client::builder()
            .timeout(config.http.timeout())
            .build()?;
        let resolver = Arc::new(BalancerClient::new(client.clone(), &config.cluster));
        Ok(Self { client, resolver })
    }

    /// Use a custom cluster resolver instead of the balancer.
    pub fn with_resolver(client: reqwest::Client, resolver: Arc<dyn ClusterResolver>) -> Self {
        Self { client, resolver }
    }

    /// Send a message to a channel. Returns true only when the server answered 201 Created.
    pub async fn send_message(&self, params: &SendParams) -> Result<bool, OrtcError> {
        if params.url.is_empty() {
            return Err(OrtcError::InvalidArguments(
                "Server URL can not be null or empty.".to_string(),
            ));
        }

        let server = if params.is_cluster {
            let resolved = self
                .resolver
                .resolve(&params.url, &params.application_key)
                .await?;
            if resolved.is_empty() {
                return Err(OrtcError::Cluster(format!(
                    "cluster {} resolved to an empty server URL",
                    params.url
                )));
            }
            resolved
        } else {
            params.url.clone()
        };

        let url = send_url(&server);
        log::debug!("ortc send: channel {} via {}", params.channel, url);
        let res = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(encode_send_body(params))
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::CREATED {
            Ok(true)
        } else {
            log::debug!("ortc send to {} was not accepted: {}", url, status);
            Ok(false)
        }
    }
}

/// Blocking front end: owns a current-thread runtime and drives `MessageClient` on it.
/// Must not be used from inside another tokio runtime.
pub struct BlockingMessageClient {
    runtime: tokio::runtime::Runtime,
    inner: MessageClient,
}

impl BlockingMessageClient {
    pub fn new(config: &Config) -> Result<Self, OrtcError> {
        Self::from_client(MessageClient::new(config)?)
    }

    pub fn from_client(inner: MessageClient) -> Result<Self, OrtcError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime, inner })
    }

    /// Blocks until the send completes. Same result semantics as [`MessageClient::send_message`].
    pub fn send_message(&self, params: &SendParams) -> Result<bool, OrtcError> {
        self.runtime.block_on(self.inner.send_message(params))
    }
}

/// `{server}/send`, adding the separator only when the server URL lacks a trailing one.
pub fn send_url(server_url: &str) -> String {
    if server_url.ends_with('/') {
        format!("{}send", server_url)
    } else {
        format!("{}/send", server_url)
    }
}

/// Form body for the send call. The message is URL-encoded once; the other fields go verbatim.
pub fn encode_send_body(params: &SendParams) -> String {
    let message: String = url::form_urlencoded::byte_serialize(params.message.as_bytes()).collect();
    format!(
        "AT={}&AK={}&PK={}&C={}&M={}",
        params.authentication_token,
        params.application_key,
        params.private_key,
        params.channel,
        message
    )
}
