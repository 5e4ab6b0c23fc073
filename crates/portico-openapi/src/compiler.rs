//! OpenAPI 3.x document compilation

use crate::examples::normalize_examples;
use crate::operation::{make_operation_id, make_url, template_params};
use crate::params::{apply_parameters, merge_parameters};
use crate::props::{OPERATION_FIELDS, PATH_ITEM_FIELDS};
use portico_core::{CompiledSpec, HttpMethod, RouteDescriptor, Schema, SecurityRequirement};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Compiles OpenAPI documents into route descriptors
#[derive(Debug, Clone, Default)]
pub struct SchemaCompiler;

impl SchemaCompiler {
    /// Create a new compiler
    pub fn new() -> Self {
        Self
    }

    /// Compile a document. Never fails: shapes the compiler does not
    /// understand are left out of the result.
    pub fn compile(&self, document: &Value) -> CompiledSpec {
        let Some(document) = document.as_object() else {
            debug!("OpenAPI document is not an object, nothing to compile");
            return CompiledSpec::default();
        };

        let mut compilation = Compilation::new(document);
        for (key, value) in document {
            match key.as_str() {
                "paths" => {
                    if let Some(paths) = value.as_object() {
                        compilation.process_paths(paths);
                    }
                }
                "components" => match value.get("securitySchemes").and_then(Value::as_object) {
                    Some(schemes) => compilation.spec.security_schemes = schemes.clone(),
                    None => {
                        compilation.spec.generic.insert(key.clone(), value.clone());
                    }
                },
                _ => {
                    compilation.spec.generic.insert(key.clone(), value.clone());
                }
            }
        }

        debug!(
            routes = compilation.spec.routes.len(),
            content_types = compilation.spec.content_types.len(),
            "OpenAPI document compiled"
        );

        compilation.spec
    }
}

/// Compile a document with a default [`SchemaCompiler`]
pub fn compile(document: &Value) -> CompiledSpec {
    SchemaCompiler::new().compile(document)
}

struct Compilation<'a> {
    document: &'a Map<String, Value>,
    spec: CompiledSpec,
    /// Operation ids already in use, declared ones included up front
    taken_ids: HashSet<String>,
}

impl<'a> Compilation<'a> {
    fn new(document: &'a Map<String, Value>) -> Self {
        Self {
            document,
            spec: CompiledSpec::default(),
            taken_ids: declared_operation_ids(document),
        }
    }

    fn process_paths(&mut self, paths: &Map<String, Value>) {
        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                trace!(path = %path, "Skipping non-object path item");
                continue;
            };

            let mut generic = Schema::new();
            PATH_ITEM_FIELDS.apply(item, &mut generic);
            let path_parameters = item.get("parameters");

            for (key, operation) in item {
                let Some(method) = HttpMethod::from_operation_key(key) else {
                    continue;
                };
                match operation.as_object() {
                    Some(operation) => {
                        let route = self.process_operation(
                            path,
                            method,
                            operation,
                            &generic,
                            path_parameters,
                        );
                        self.spec.routes.push(route);
                    }
                    None => trace!(path = %path, method = %method, "Skipping non-object operation"),
                }
            }
        }
    }

    fn process_operation(
        &mut self,
        path: &str,
        method: HttpMethod,
        operation: &Map<String, Value>,
        generic: &Schema,
        path_parameters: Option<&Value>,
    ) -> RouteDescriptor {
        let mut schema = generic.clone();
        OPERATION_FIELDS.apply(operation, &mut schema);

        let parameters = merge_parameters(path_parameters, operation.get("parameters"));
        apply_parameters(&mut schema, &parameters, &template_params(path));

        if let Some(body) = self.parse_body(operation.get("requestBody")) {
            schema.insert("body".to_string(), body);
        }

        let response = self.parse_responses(operation.get("responses"));
        if !response.is_empty() {
            schema.insert("response".to_string(), Value::Object(response));
        }

        let operation_id = match declared_id(operation) {
            Some(id) => id.to_string(),
            None => self.derive_operation_id(method, path),
        };

        let security = operation
            .get("security")
            .filter(|security| security.is_array())
            .or_else(|| self.document.get("security"))
            .and_then(parse_security);

        RouteDescriptor {
            method,
            url: make_url(path),
            schema,
            operation_id,
            security,
            openapi_source: Value::Object(operation.clone()),
        }
    }

    /// Pick the schema of the last declared MIME type and record every
    /// declared type.
    fn parse_body(&mut self, container: Option<&Value>) -> Option<Value> {
        let content = container?.get("content")?.as_object()?;
        self.spec.content_types.extend(content.keys().cloned());

        let (_, media) = content.iter().last()?;
        let mut schema = media.get("schema")?.clone();
        normalize_examples(&mut schema);
        Some(schema)
    }

    fn parse_responses(&mut self, responses: Option<&Value>) -> Map<String, Value> {
        let mut result = Map::new();
        let Some(responses) = responses.and_then(Value::as_object) else {
            return result;
        };

        for (status, response) in responses {
            if let Some(body) = self.parse_body(Some(response)) {
                result.insert(status.clone(), body);
            }
        }
        result
    }

    /// Derived ids colliding with an id already in use get a numeric suffix.
    fn derive_operation_id(&mut self, method: HttpMethod, path: &str) -> String {
        let base = make_operation_id(method.operation_key(), path);
        let mut candidate = base.clone();
        let mut ordinal = 2;
        while self.taken_ids.contains(&candidate) {
            candidate = format!("{base}{ordinal}");
            ordinal += 1;
        }
        self.taken_ids.insert(candidate.clone());
        candidate
    }
}

fn declared_id(operation: &Map<String, Value>) -> Option<&str> {
    operation
        .get("operationId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

fn declared_operation_ids(document: &Map<String, Value>) -> HashSet<String> {
    document
        .get("paths")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|paths| paths.values())
        .filter_map(Value::as_object)
        .flat_map(|item| {
            item.iter()
                .filter(|(key, _)| HttpMethod::from_operation_key(key).is_some())
                .filter_map(|(_, operation)| operation.as_object())
        })
        .filter_map(declared_id)
        .map(str::to_string)
        .collect()
}

/// Normalize `[{schemeName: [scopes]}, ...]` into one name/parameter pair
/// per alternative. Only the first scheme of a requirement object is kept.
/// Anonymous (`{}`) requirements carry no scheme and are skipped.
fn parse_security(value: &Value) -> Option<Vec<SecurityRequirement>> {
    let requirements = value.as_array()?;
    Some(
        requirements
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|requirement| requirement.iter().next())
            .map(|(name, parameters)| SecurityRequirement {
                name: name.clone(),
                parameters: parameters.clone(),
            })
            .collect(),
    )
}
