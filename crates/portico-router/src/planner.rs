//! Route planning
//!
//! A [`RoutePlanner`] turns each refresh record into gateway routes. A
//! record with resolved routes yields one route per operation; a record
//! without routes yields a single catch-all route on every method.
//!
//! Rate limits are taken from the operation's `x-rate-limit` extension,
//! then the service's `hit_limit`, then the gateway default. Operation
//! routes pass the auth handler only when the operation declares security.

use crate::route::{GatewayRoute, UpstreamTarget, WILDCARD_PATH};
use portico_config::GatewayConfig;
use portico_core::{RateLimit, RefreshRecord, Result, RouteDescriptor, ServiceEntry};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Body limit used when neither the service nor the gateway sets one
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Operation extension carrying a per-route rate limit
pub const RATE_LIMIT_EXTENSION: &str = "x-rate-limit";

/// Formats the response validator does not understand
const UNKNOWN_FORMATS: &[&str] = &[
    "byte", "int32", "int64", "float", "double", "binary", "password",
];

/// Plans gateway routes from refresh records
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlanner {
    expose_docs: bool,
    require_auth: bool,
    body_limit: usize,
    default_limit: Option<RateLimit>,
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self {
            expose_docs: true,
            require_auth: false,
            body_limit: DEFAULT_BODY_LIMIT,
            default_limit: None,
        }
    }
}

impl RoutePlanner {
    /// Planner with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Planner using the gateway-wide defaults
    pub fn from_config(gateway: &GatewayConfig) -> Self {
        Self {
            expose_docs: gateway.expose_docs,
            require_auth: gateway.require_auth,
            body_limit: gateway.body_limit,
            default_limit: gateway.default_limit,
        }
    }

    /// Enable or disable documentation exposure
    pub fn expose_docs(mut self, enabled: bool) -> Self {
        self.expose_docs = enabled;
        self
    }

    /// Set the default auth policy
    pub fn require_auth(mut self, required: bool) -> Self {
        self.require_auth = required;
        self
    }

    /// Set the default body limit
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Set the default rate limit
    pub fn default_limit(mut self, limit: Option<RateLimit>) -> Self {
        self.default_limit = limit;
        self
    }

    /// Plan every record, keeping record order
    pub fn plan(&self, records: &[RefreshRecord]) -> Result<Vec<GatewayRoute>> {
        let mut routes = Vec::new();
        for record in records {
            routes.extend(self.plan_record(record)?);
        }
        debug!(records = records.len(), routes = routes.len(), "Planned gateway routes");
        Ok(routes)
    }

    /// Plan the routes of one record
    pub fn plan_record(&self, record: &RefreshRecord) -> Result<Vec<GatewayRoute>> {
        match &record.routes {
            Some(routes) => routes
                .iter()
                .map(|route| self.plan_route(&record.service, route))
                .collect(),
            None => Ok(vec![self.plan_fallback(&record.service)?]),
        }
    }

    fn plan_route(&self, service: &ServiceEntry, route: &RouteDescriptor) -> Result<GatewayRoute> {
        let mut schema = route.schema.clone();

        if let Some(response) = schema.get_mut("response") {
            strip_unknown_formats(response);
        }

        if self.expose_docs {
            if let Some(first) = route.security.as_ref().and_then(|security| security.first()) {
                let mut requirement = Map::new();
                requirement.insert(first.name.clone(), first.parameters.clone());
                append_security(&mut schema, Value::Object(requirement));
            }
        }

        let limit = operation_limit(route)
            .or(service.hit_limit)
            .or(self.default_limit);
        let secured = route
            .security
            .as_ref()
            .is_some_and(|security| !security.is_empty());

        GatewayRoute::builder()
            .method(route.method)
            .url(gateway_url(service, &route.url))
            .schema(schema)
            .operation_id(route.operation_id.clone())
            .limit(limit)
            .security(route.security.clone())
            .requires_auth(secured && self.requires_auth(service))
            .body_limit(self.body_limit_for(service))
            .upstream(UpstreamTarget::from_service(service))
            .build()
    }

    fn plan_fallback(&self, service: &ServiceEntry) -> Result<GatewayRoute> {
        debug!(service = %service.host, "Planning wildcard fallback");

        GatewayRoute::builder()
            .any_method()
            .url(gateway_url(service, WILDCARD_PATH))
            .limit(service.hit_limit.or(self.default_limit))
            .requires_auth(self.requires_auth(service))
            .body_limit(self.body_limit_for(service))
            .upstream(UpstreamTarget::from_service(service))
            .build()
    }

    fn requires_auth(&self, service: &ServiceEntry) -> bool {
        service.require_auth.unwrap_or(self.require_auth)
    }

    fn body_limit_for(&self, service: &ServiceEntry) -> usize {
        service.body_limit.unwrap_or(self.body_limit)
    }
}

/// Gateway path for a service route: gateway prefix added, first
/// occurrence of the remote prefix removed, repeated slashes collapsed.
fn gateway_url(service: &ServiceEntry, url: &str) -> String {
    let mut gateway = match service.gw_base_url.as_deref() {
        Some(prefix) => format!("{prefix}{url}"),
        None => url.to_string(),
    };

    if let Some(remote) = service.remote_base_url.as_deref().filter(|r| !r.is_empty()) {
        gateway = gateway.replacen(remote, "", 1);
    }

    collapse_slashes(&gateway)
}

fn collapse_slashes(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}

fn operation_limit(route: &RouteDescriptor) -> Option<RateLimit> {
    let value = route.schema.get(RATE_LIMIT_EXTENSION)?;

    let limit = match value {
        Value::Number(max) => max
            .as_u64()
            .and_then(|max| u32::try_from(max).ok())
            .map(RateLimit::per_minute),
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    };

    if limit.is_none() {
        warn!(
            operation = %route.operation_id,
            value = %value,
            "Ignoring invalid rate-limit extension"
        );
    }
    limit
}

fn append_security(schema: &mut Map<String, Value>, requirement: Value) {
    match schema.get_mut("security") {
        Some(Value::Array(existing)) => existing.push(requirement),
        _ => {
            schema.insert("security".to_string(), Value::Array(vec![requirement]));
        }
    }
}

/// Remove `format` keywords the validator rejects, at any depth
fn strip_unknown_formats(value: &mut Value) {
    match value {
        Value::Object(object) => {
            let unknown = object
                .get("format")
                .and_then(Value::as_str)
                .is_some_and(|format| UNKNOWN_FORMATS.contains(&format));
            if unknown {
                object.retain(|key, _| key != "format");
            }
            object.values_mut().for_each(strip_unknown_formats);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_unknown_formats),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::{HttpMethod, SecurityRequirement};
    use serde_json::json;
    use std::time::Duration;

    fn descriptor(url: &str, schema: Value) -> RouteDescriptor {
        RouteDescriptor {
            method: HttpMethod::Get,
            url: url.to_string(),
            schema: schema.as_object().cloned().unwrap_or_default(),
            operation_id: "getUsers".to_string(),
            security: None,
            openapi_source: json!({}),
        }
    }

    fn record(service: ServiceEntry, routes: Option<Vec<RouteDescriptor>>) -> RefreshRecord {
        RefreshRecord { service, routes }
    }

    #[test]
    fn test_url_prefixing() {
        let mut service = ServiceEntry::new("http://users:3000");
        service.gw_base_url = Some("/users/".to_string());
        service.remote_base_url = Some("/v1/users/".to_string());

        assert_eq!(gateway_url(&service, "/v1/users/:id"), "/users/:id");
        assert_eq!(gateway_url(&service, "/*"), "/users/*");

        service.remote_base_url = None;
        assert_eq!(gateway_url(&service, "/list"), "/users/list");
        assert_eq!(gateway_url(&ServiceEntry::new("http://a"), "//a//b"), "/a/b");
    }

    #[test]
    fn test_wildcard_fallback() {
        let mut service = ServiceEntry::new("http://legacy:8080");
        service.gw_base_url = Some("/legacy".to_string());
        service.require_auth = Some(true);
        service.hit_limit = Some(RateLimit::per_minute(5));

        let routes = RoutePlanner::new().plan(&[record(service, None)]).unwrap();

        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        assert_eq!(route.url, "/legacy/*");
        assert_eq!(route.methods, HttpMethod::ALL.to_vec());
        assert!(route.schema.is_none());
        assert!(route.requires_auth);
        assert_eq!(route.limit, Some(RateLimit::per_minute(5)));
        assert_eq!(route.body_limit, DEFAULT_BODY_LIMIT);
        assert!(route.is_wildcard());
    }

    #[test]
    fn test_limit_precedence() {
        let gateway_default = RateLimit::per_minute(3000);
        let planner = RoutePlanner::new().default_limit(Some(gateway_default));

        let mut service = ServiceEntry::new("http://users:3000");
        let routes = vec![
            descriptor("/a", json!({ "x-rate-limit": 7 })),
            descriptor("/b", json!({ "x-rate-limit": { "max": 2, "time_window": "10s" } })),
            descriptor("/c", json!({})),
            descriptor("/d", json!({ "x-rate-limit": "lots" })),
        ];

        let planned = planner.plan(&[record(service.clone(), Some(routes.clone()))]).unwrap();
        assert_eq!(planned[0].limit, Some(RateLimit::per_minute(7)));
        assert_eq!(
            planned[1].limit,
            Some(RateLimit {
                max: 2,
                time_window: Duration::from_secs(10)
            })
        );
        assert_eq!(planned[2].limit, Some(gateway_default));
        assert_eq!(planned[3].limit, Some(gateway_default));

        service.hit_limit = Some(RateLimit::per_minute(10));
        let planned = planner.plan(&[record(service, Some(routes))]).unwrap();
        assert_eq!(planned[0].limit, Some(RateLimit::per_minute(7)));
        assert_eq!(planned[2].limit, Some(RateLimit::per_minute(10)));
    }

    #[test]
    fn test_no_limit_configured() {
        let routes = vec![descriptor("/a", json!({}))];
        let planned = RoutePlanner::new()
            .plan(&[record(ServiceEntry::new("http://a"), Some(routes))])
            .unwrap();
        assert!(planned[0].limit.is_none());
    }

    #[test]
    fn test_response_formats_stripped() {
        let route = descriptor(
            "/users",
            json!({
                "querystring": {
                    "type": "object",
                    "properties": { "n": { "type": "integer", "format": "int32" } }
                },
                "response": {
                    "200": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "email": { "type": "string", "format": "email" },
                            "tags": {
                                "type": "array",
                                "items": { "type": "string", "format": "byte" }
                            }
                        }
                    }
                }
            }),
        );

        let planned = RoutePlanner::new()
            .plan(&[record(ServiceEntry::new("http://users"), Some(vec![route]))])
            .unwrap();
        let schema = planned[0].schema.as_ref().unwrap();
        let properties = &schema["response"]["200"]["properties"];

        assert!(properties["id"].get("format").is_none());
        assert_eq!(properties["email"]["format"], "email");
        assert!(properties["tags"]["items"].get("format").is_none());
        assert_eq!(schema["querystring"]["properties"]["n"]["format"], "int32");
    }

    #[test]
    fn test_security_appended_when_docs_exposed() {
        let mut route = descriptor("/users", json!({ "security": [{ "basic": [] }] }));
        route.security = Some(vec![
            SecurityRequirement {
                name: "apiKey".to_string(),
                parameters: json!([]),
            },
            SecurityRequirement {
                name: "oauth".to_string(),
                parameters: json!(["read"]),
            },
        ]);
        let records = [record(ServiceEntry::new("http://users"), Some(vec![route]))];

        let planned = RoutePlanner::new().plan(&records).unwrap();
        assert_eq!(
            planned[0].schema.as_ref().unwrap()["security"],
            json!([{ "basic": [] }, { "apiKey": [] }])
        );
        assert_eq!(planned[0].security.as_ref().map(Vec::len), Some(2));

        let planned = RoutePlanner::new().expose_docs(false).plan(&records).unwrap();
        assert_eq!(
            planned[0].schema.as_ref().unwrap()["security"],
            json!([{ "basic": [] }])
        );
    }

    #[test]
    fn test_body_limit_and_auth_overrides() {
        let gateway = GatewayConfig {
            require_auth: true,
            body_limit: 512,
            ..GatewayConfig::default()
        };
        let planner = RoutePlanner::from_config(&gateway);

        let mut open = ServiceEntry::new("http://open");
        open.require_auth = Some(false);
        open.body_limit = Some(4096);

        let planned = planner
            .plan(&[
                record(ServiceEntry::new("http://default"), None),
                record(open, Some(vec![descriptor("/a", json!({}))])),
            ])
            .unwrap();

        assert!(planned[0].requires_auth);
        assert_eq!(planned[0].body_limit, 512);
        assert!(!planned[1].requires_auth);
        assert_eq!(planned[1].body_limit, 4096);
        assert_eq!(planned[1].operation_id.as_deref(), Some("getUsers"));
    }

    #[test]
    fn test_auth_only_on_secured_operations() {
        let mut service = ServiceEntry::new("http://users");
        service.require_auth = Some(true);

        let mut secured = descriptor("/users", json!({}));
        secured.security = Some(vec![SecurityRequirement {
            name: "apiKey".to_string(),
            parameters: json!([]),
        }]);
        let mut empty = descriptor("/login", json!({}));
        empty.security = Some(Vec::new());
        let health = descriptor("/health", json!({}));

        let planned = RoutePlanner::new()
            .plan(&[record(service, Some(vec![secured, empty, health]))])
            .unwrap();

        assert!(planned[0].requires_auth);
        assert!(!planned[1].requires_auth);
        assert!(!planned[2].requires_auth);
        assert!(planned[2].security.is_none());
    }

    #[test]
    fn test_source_routes_unchanged() {
        let route = descriptor(
            "/users",
            json!({ "response": { "200": { "type": "integer", "format": "int32" } } }),
        );
        let records = [record(ServiceEntry::new("http://users"), Some(vec![route]))];
        RoutePlanner::new().plan(&records).unwrap();

        let source = records[0].routes.as_ref().unwrap();
        assert_eq!(source[0].schema["response"]["200"]["format"], "int32");
    }
}
