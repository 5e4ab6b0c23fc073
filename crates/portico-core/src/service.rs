//! Backend service entries and refresh records

use crate::route::RouteDescriptor;
use crate::types::RateLimit;
use serde::{Deserialize, Serialize};

/// Schema-discovery endpoint used when a service does not override it
pub const DEFAULT_OPENAPI_URL: &str = "/open-api/json";

/// One backend service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Service origin (e.g., "http://users:3000")
    pub host: String,

    /// Schema-discovery endpoint path
    #[serde(default = "default_openapi_url")]
    pub openapi_url: String,

    /// Public tag override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Hidden tag override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_tag: Option<String>,

    /// Per-service rate limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_limit: Option<RateLimit>,

    /// Prefix added to request paths before forwarding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_base_url: Option<String>,

    /// Prefix under which the service is exposed on the gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gw_base_url: Option<String>,

    /// Max request body size (bytes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_limit: Option<usize>,

    /// Whether requests must pass the gateway auth handler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_auth: Option<bool>,
}

fn default_openapi_url() -> String {
    DEFAULT_OPENAPI_URL.to_string()
}

impl ServiceEntry {
    /// Create an entry with default settings for `host`
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            openapi_url: default_openapi_url(),
            tag: None,
            hidden_tag: None,
            hit_limit: None,
            remote_base_url: None,
            gw_base_url: None,
            body_limit: None,
            require_auth: None,
        }
    }

    /// Full URL of the schema-discovery endpoint
    pub fn schema_url(&self) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), self.openapi_url)
    }
}

/// Persisted result for one service after a refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshRecord {
    /// The service the routes belong to
    pub service: ServiceEntry,

    /// Resolved routes; `None` when the service exposed no schema and is
    /// proxied through the wildcard fallback
    pub routes: Option<Vec<RouteDescriptor>>,
}

impl RefreshRecord {
    /// True when the service falls back to the wildcard proxy
    pub fn is_fallback(&self) -> bool {
        self.routes.is_none()
    }
}
