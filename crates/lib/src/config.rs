//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.ortc/config.json`) and environment.
//! Credentials can live in the file or come from `ORTC_*` env vars, which take precedence.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level client config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// ORTC server (or cluster balancer) address.
    #[serde(default)]
    pub server: ServerConfig,

    /// Application credentials sent with every message.
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Cluster balancer retry settings.
    #[serde(default)]
    pub cluster: ClusterConfig,
}

/// Server URL and whether it points at a cluster balancer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Server URL, e.g. "https://ortc-developers.realtime.co/server/2.1".
    pub url: Option<String>,

    /// When true, `url` is a balancer and the actual server is resolved before sending.
    #[serde(default)]
    pub is_cluster: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfig {
    /// Application key. Overridden by ORTC_APPLICATION_KEY env.
    pub application_key: Option<String>,
    /// Private key. Overridden by ORTC_PRIVATE_KEY env.
    pub private_key: Option<String>,
    /// Authentication token issued by the application server. Overridden by ORTC_AUTH_TOKEN env.
    pub authentication_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    /// Whole-request timeout in seconds (default 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Balancer attempts before giving up (default 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between balancer attempts in milliseconds (default 3000).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    3000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl ClusterConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Env value if set and non-blank, else the trimmed non-blank config value.
fn env_or(var: &str, configured: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            configured
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the application key: env ORTC_APPLICATION_KEY overrides config.
pub fn resolve_application_key(config: &Config) -> Option<String> {
    env_or(
        "ORTC_APPLICATION_KEY",
        config.credentials.application_key.as_ref(),
    )
}

/// Resolve the private key: env ORTC_PRIVATE_KEY overrides config.
pub fn resolve_private_key(config: &Config) -> Option<String> {
    env_or("ORTC_PRIVATE_KEY", config.credentials.private_key.as_ref())
}

/// Resolve the authentication token: env ORTC_AUTH_TOKEN overrides config.
pub fn resolve_authentication_token(config: &Config) -> Option<String> {
    env_or(
        "ORTC_AUTH_TOKEN",
        config.credentials.authentication_token.as_ref(),
    )
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("ORTC_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".ortc").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, the default path, or ORTC_CONFIG_PATH. Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
