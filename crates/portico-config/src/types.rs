//! Configuration types

use portico_core::{RateLimit, ServiceEntry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Gateway-wide defaults
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Refresh cycle settings
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Schema fetch client settings
    #[serde(default)]
    pub http_client: HttpClientConfig,

    /// Backend services, in declaration order
    #[serde(default)]
    pub services: Vec<ServiceEntry>,

    /// Observability
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Gateway-wide defaults applied to every service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Tag that makes an operation public
    pub public_tag: String,

    /// Tag that makes an operation proxied but hidden from docs
    pub hidden_tag: String,

    /// Externally-visible replacement for the hidden tag
    pub hidden_marker: String,

    /// Rewrite tags for the gateway's documentation (tags are removed
    /// when disabled)
    pub expose_docs: bool,

    /// Never proxy hidden operations
    pub ignore_hidden: bool,

    /// Default auth policy for planned routes
    pub require_auth: bool,

    /// Default max request body size (bytes)
    pub body_limit: usize,

    /// Rate limit used when neither the operation nor the service sets one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<RateLimit>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            public_tag: "public-api".to_string(),
            hidden_tag: "private-api".to_string(),
            hidden_marker: "X-HIDDEN".to_string(),
            expose_docs: true,
            ignore_hidden: false,
            require_auth: false,
            body_limit: default_body_limit(),
            default_limit: None,
        }
    }
}

fn default_body_limit() -> usize {
    1024 * 1024 // 1 MiB
}

/// Refresh cycle settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    /// Delay between the end of one cycle and the start of the next;
    /// no periodic refresh when absent
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub interval: Option<Duration>,

    /// Route cache file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes_file: Option<PathBuf>,

    /// Delete the cache file at shutdown
    pub ephemeral_routes_file: bool,

    /// Max concurrent schema fetches
    pub fetch_concurrency: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: None,
            routes_file: None,
            ephemeral_routes_file: false,
            fetch_concurrency: 4,
        }
    }
}

/// Schema fetch client settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Whole-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Idle pooled connections are closed after this long
    #[serde(with = "humantime_serde")]
    pub keep_alive_timeout: Duration,

    /// Max idle connections kept per host
    pub connections: usize,

    /// Accept self-signed or otherwise invalid certificates
    pub accept_invalid_certs: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            keep_alive_timeout: Duration::from_secs(5),
            connections: 10,
            accept_invalid_certs: false,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    pub level: String,

    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}
