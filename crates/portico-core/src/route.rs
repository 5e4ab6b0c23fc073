//! Compiled route descriptors

use crate::types::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// JSON object used for validation schemas and generic OpenAPI fields.
/// Key order follows the source document.
pub type Schema = Map<String, Value>;

/// A security requirement normalized from `{schemeName: [scopes]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRequirement {
    /// Security scheme name
    pub name: String,
    /// Scheme parameters (usually the list of scopes)
    pub parameters: Value,
}

/// The compiled, proxy-ready representation of one OpenAPI operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    /// HTTP method
    pub method: HttpMethod,

    /// Path template with colon placeholders (e.g., "/user/:name")
    pub url: String,

    /// Validation schema (`params`, `querystring`, `headers`, `body`,
    /// `response`) plus the copied documentation fields
    pub schema: Schema,

    /// Operation id, declared or derived
    pub operation_id: String,

    /// Security requirements, operation-level or inherited from the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,

    /// Original operation fragment
    #[serde(default)]
    pub openapi_source: Value,
}

impl RouteDescriptor {
    /// String entries of `schema.tags`
    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.schema
            .get("tags")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    /// Names of the path parameters listed as required in `schema.params`
    pub fn required_params(&self) -> Vec<&str> {
        self.schema
            .get("params")
            .and_then(|params| params.get("required"))
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Result of compiling one OpenAPI document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledSpec {
    /// Top-level fields not handled individually
    pub generic: Schema,

    /// Compiled routes in document order
    pub routes: Vec<RouteDescriptor>,

    /// MIME types seen in request and response bodies
    pub content_types: BTreeSet<String>,

    /// `components.securitySchemes`, keyed by scheme name
    pub security_schemes: Schema,
}
