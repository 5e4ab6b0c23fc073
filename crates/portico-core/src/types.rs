//! Common types used throughout Portico

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// HTTP methods an OpenAPI path item can declare as operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// DELETE
    Delete,
    /// GET
    Get,
    /// HEAD
    Head,
    /// PATCH
    Patch,
    /// POST
    Post,
    /// PUT
    Put,
    /// OPTIONS
    Options,
}

impl HttpMethod {
    /// Every recognized operation method
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Delete,
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Options,
    ];

    /// Parse a path-item key (`get`, `post`, ...). Keys are matched
    /// exactly, so `GET` or `parameters` yield `None`.
    pub fn from_operation_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.operation_key() == key)
    }

    /// Lowercase key used for this method in an OpenAPI path item
    pub fn operation_key(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Get => "get",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Post => "post",
            Self::Put => "put",
            Self::Options => "options",
        }
    }

    /// Uppercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Delete => http::Method::DELETE,
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Head => http::Method::HEAD,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Options => http::Method::OPTIONS,
        }
    }
}

/// Rate-limit descriptor. Opaque to route compilation; handed unchanged to
/// the rate-limit engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Maximum number of requests per window
    pub max: u32,

    /// Window length
    #[serde(default = "default_time_window", with = "humantime_serde")]
    pub time_window: Duration,
}

impl RateLimit {
    /// Window used when none is configured
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

    /// Limit of `max` requests per minute
    pub fn per_minute(max: u32) -> Self {
        Self {
            max,
            time_window: Self::DEFAULT_WINDOW,
        }
    }
}

fn default_time_window() -> Duration {
    RateLimit::DEFAULT_WINDOW
}
