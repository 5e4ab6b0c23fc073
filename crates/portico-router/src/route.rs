//! Gateway route definition and builder

use portico_core::{Error, HttpMethod, RateLimit, Result, Schema, SecurityRequirement, ServiceEntry};
use serde::Serialize;

/// Path of the catch-all route registered for schema-less services
pub const WILDCARD_PATH: &str = "/*";

/// Where a gateway route forwards to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamTarget {
    /// Service origin
    pub host: String,

    /// Prefix added to the forwarded path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_base_url: Option<String>,

    /// Gateway prefix removed from the request path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gw_base_url: Option<String>,
}

impl UpstreamTarget {
    /// Target for `service`
    pub fn from_service(service: &ServiceEntry) -> Self {
        Self {
            host: service.host.clone(),
            remote_base_url: service.remote_base_url.clone(),
            gw_base_url: service.gw_base_url.clone(),
        }
    }

    /// Path to request on the service for an incoming gateway path: the
    /// first occurrence of the gateway prefix is removed and the remote
    /// prefix prepended.
    pub fn remote_path(&self, request_path: &str) -> String {
        let stripped = match self.gw_base_url.as_deref().filter(|prefix| !prefix.is_empty()) {
            Some(prefix) => request_path.replacen(prefix, "", 1),
            None => request_path.to_string(),
        };

        match self.remote_base_url.as_deref() {
            Some(prefix) => format!("{prefix}{stripped}"),
            None => stripped,
        }
    }

    /// Absolute URL to request on the service
    pub fn remote_url(&self, request_path: &str) -> String {
        format!(
            "{}{}",
            self.host.trim_end_matches('/'),
            self.remote_path(request_path)
        )
    }
}

/// A route ready for registration with the proxy engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayRoute {
    /// Accepted methods
    pub methods: Vec<HttpMethod>,

    /// Gateway path pattern (e.g., "/users/:id")
    pub url: String,

    /// Validation schema; `None` for the wildcard fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    /// Operation id of the source operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    /// Rate limit handed to the rate-limit engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<RateLimit>,

    /// Security requirements of the source operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,

    /// Requests must pass the gateway auth handler
    pub requires_auth: bool,

    /// Max request body size (bytes)
    pub body_limit: usize,

    /// Forwarding target
    pub upstream: UpstreamTarget,
}

impl GatewayRoute {
    /// Create a new route builder
    pub fn builder() -> RouteBuilder {
        RouteBuilder::new()
    }

    /// True for the catch-all fallback route
    pub fn is_wildcard(&self) -> bool {
        self.schema.is_none() && self.url.ends_with(WILDCARD_PATH)
    }

    /// Methods as `http` types
    pub fn http_methods(&self) -> Vec<http::Method> {
        self.methods.iter().copied().map(http::Method::from).collect()
    }
}

/// Builder for constructing gateway routes
#[derive(Debug, Default)]
pub struct RouteBuilder {
    methods: Vec<HttpMethod>,
    url: Option<String>,
    schema: Option<Schema>,
    operation_id: Option<String>,
    limit: Option<RateLimit>,
    security: Option<Vec<SecurityRequirement>>,
    requires_auth: bool,
    body_limit: Option<usize>,
    upstream: Option<UpstreamTarget>,
}

impl RouteBuilder {
    /// Create a new route builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an accepted method
    pub fn method(mut self, method: HttpMethod) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    /// Accept every method
    pub fn any_method(mut self) -> Self {
        self.methods = HttpMethod::ALL.to_vec();
        self
    }

    /// Set the path pattern
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the validation schema
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the operation id
    pub fn operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Set the rate limit
    pub fn limit(mut self, limit: Option<RateLimit>) -> Self {
        self.limit = limit;
        self
    }

    /// Set the security requirements
    pub fn security(mut self, security: Option<Vec<SecurityRequirement>>) -> Self {
        self.security = security;
        self
    }

    /// Require the gateway auth handler
    pub fn requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    /// Set the body limit
    pub fn body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = Some(body_limit);
        self
    }

    /// Set the forwarding target
    pub fn upstream(mut self, upstream: UpstreamTarget) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Build the route
    pub fn build(self) -> Result<GatewayRoute> {
        if self.methods.is_empty() {
            return Err(Error::Config("at least one method is required".to_string()));
        }

        let url = self
            .url
            .ok_or_else(|| Error::Config("url is required".to_string()))?;

        let upstream = self
            .upstream
            .ok_or_else(|| Error::Config("upstream is required".to_string()))?;

        let body_limit = self
            .body_limit
            .ok_or_else(|| Error::Config("body_limit is required".to_string()))?;

        if !url.starts_with('/') {
            return Err(Error::Config(format!("url must start with '/': {url}")));
        }

        Ok(GatewayRoute {
            methods: self.methods,
            url,
            schema: self.schema,
            operation_id: self.operation_id,
            limit: self.limit,
            security: self.security,
            requires_auth: self.requires_auth,
            body_limit,
            upstream,
        })
    }
}
