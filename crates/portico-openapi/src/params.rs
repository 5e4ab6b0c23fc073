//! Parameter partitioning and parameter-group schemas

use crate::props::PARAMETER_FIELDS;
use portico_core::Schema;
use serde_json::{json, Map, Value};

/// Where a parameter is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Path,
    Query,
    Header,
}

impl Location {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            _ => None,
        }
    }
}

/// A parameter object with the fields the compiler reads
#[derive(Debug, Clone)]
pub(crate) struct Parameter<'a> {
    name: &'a str,
    location: Location,
    required: bool,
    explode: Option<bool>,
    schema: Option<&'a Value>,
    source: &'a Map<String, Value>,
}

impl<'a> Parameter<'a> {
    /// Read a parameter object. Unresolved `$ref`s, cookie parameters and
    /// parameters without a name are skipped.
    fn parse(value: &'a Value) -> Option<Self> {
        let source = value.as_object()?;
        let name = source.get("name")?.as_str()?;
        let location = Location::parse(source.get("in")?.as_str()?)?;

        Some(Self {
            name,
            location,
            required: source.get("required").and_then(Value::as_bool) == Some(true),
            explode: source.get("explode").and_then(Value::as_bool),
            schema: source.get("schema"),
            source,
        })
    }

    fn same_slot(&self, other: &Parameter<'_>) -> bool {
        self.name == other.name && self.location == other.location
    }

    /// Property schema: the declared schema plus documentation fields
    fn property(&self) -> Value {
        let mut property = self
            .schema
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        PARAMETER_FIELDS.apply(self.source, &mut property);
        Value::Object(property)
    }

    fn schema_type(&self) -> Option<&str> {
        self.schema?.get("type")?.as_str()
    }
}

/// Combine path-level and operation-level parameter lists. An operation
/// parameter replaces a path-level one with the same name and location.
pub(crate) fn merge_parameters<'a>(
    path_level: Option<&'a Value>,
    operation_level: Option<&'a Value>,
) -> Vec<Parameter<'a>> {
    let mut merged: Vec<Parameter<'a>> = parse_list(path_level).collect();

    for parameter in parse_list(operation_level) {
        match merged.iter_mut().find(|existing| existing.same_slot(&parameter)) {
            Some(existing) => *existing = parameter,
            None => merged.push(parameter),
        }
    }

    merged
}

fn parse_list(list: Option<&Value>) -> impl Iterator<Item = Parameter<'_>> {
    list.and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Parameter::parse)
}

/// Write `params`, `querystring` and `headers` into `schema`.
///
/// Path parameters are always required. Template placeholders without a
/// declared parameter get a plain string property.
pub(crate) fn apply_parameters(
    schema: &mut Schema,
    parameters: &[Parameter<'_>],
    template: &[&str],
) {
    let path = at(parameters, Location::Path);
    if !path.is_empty() || !template.is_empty() {
        schema.insert("params".to_string(), path_schema(&path, template));
    }

    let query = at(parameters, Location::Query);
    if !query.is_empty() {
        schema.insert("querystring".to_string(), querystring_schema(&query));
    }

    let headers = at(parameters, Location::Header);
    if !headers.is_empty() {
        schema.insert("headers".to_string(), object_schema(&headers));
    }
}

fn at<'p, 'a>(parameters: &'p [Parameter<'a>], location: Location) -> Vec<&'p Parameter<'a>> {
    parameters
        .iter()
        .filter(|parameter| parameter.location == location)
        .collect()
}

/// Object schema whose properties are the parameters, with `required`
/// listing the parameters flagged required (omitted when empty)
fn object_schema(parameters: &[&Parameter<'_>]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for parameter in parameters {
        properties.insert(parameter.name.to_string(), parameter.property());
        if parameter.required {
            required.push(Value::String(parameter.name.to_string()));
        }
    }

    object_with(properties, required)
}

fn path_schema(parameters: &[&Parameter<'_>], template: &[&str]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for parameter in parameters {
        properties.insert(parameter.name.to_string(), parameter.property());
        required.push(Value::String(parameter.name.to_string()));
    }
    for name in template {
        if !properties.contains_key(*name) {
            properties.insert(name.to_string(), json!({ "type": "string" }));
            required.push(Value::String(name.to_string()));
        }
    }

    object_with(properties, required)
}

fn object_with(properties: Map<String, Value>, required: Vec<Value>) -> Value {
    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Value::Object(schema)
}

/// A single exploded object/array parameter is the querystring schema
/// itself; anything else is wrapped in an object schema.
fn querystring_schema(parameters: &[&Parameter<'_>]) -> Value {
    if let [single] = parameters {
        let exploding_type = matches!(single.schema_type(), Some("object" | "array"));
        if single.explode != Some(false) && exploding_type {
            if let Some(schema) = single.schema {
                return schema.clone();
            }
        }
    }
    object_schema(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(parameters: Value, template: &[&str]) -> Schema {
        let parsed = merge_parameters(None, Some(&parameters));
        let mut schema = Map::new();
        apply_parameters(&mut schema, &parsed, template);
        schema
    }

    #[test]
    fn test_partition_by_location() {
        let schema = compile(
            json!([
                { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } },
                { "name": "limit", "in": "query", "schema": { "type": "integer" } },
                {
                    "name": "x-trace",
                    "in": "header",
                    "required": true,
                    "schema": { "type": "string" }
                },
                { "name": "session", "in": "cookie", "schema": { "type": "string" } }
            ]),
            &["id"],
        );

        assert_eq!(
            schema["params"],
            json!({
                "type": "object",
                "properties": { "id": { "type": "integer" } },
                "required": ["id"]
            })
        );
        assert_eq!(
            schema["querystring"],
            json!({ "type": "object", "properties": { "limit": { "type": "integer" } } })
        );
        assert_eq!(schema["headers"]["required"], json!(["x-trace"]));
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn test_property_copies_description_and_extensions() {
        let schema = compile(
            json!([{
                "name": "q",
                "in": "query",
                "description": "search text",
                "x-example-source": "docs",
                "deprecated": true,
                "schema": { "type": "string" }
            }]),
            &[],
        );

        assert_eq!(
            schema["querystring"]["properties"]["q"],
            json!({ "type": "string", "description": "search text", "x-example-source": "docs" })
        );
    }

    #[test]
    fn test_exploded_array_query_is_raw_schema() {
        let raw = json!({ "type": "array", "items": { "type": "string" } });
        let schema = compile(json!([{ "name": "ids", "in": "query", "schema": raw }]), &[]);
        assert_eq!(schema["querystring"], raw);
    }

    #[test]
    fn test_several_query_params_are_wrapped() {
        let schema = compile(
            json!([
                {
                    "name": "ids",
                    "in": "query",
                    "required": true,
                    "schema": { "type": "array", "items": { "type": "integer" } }
                },
                { "name": "page", "in": "query", "schema": { "type": "integer" } }
            ]),
            &[],
        );

        assert_eq!(
            schema["querystring"],
            json!({
                "type": "object",
                "properties": {
                    "ids": { "type": "array", "items": { "type": "integer" } },
                    "page": { "type": "integer" }
                },
                "required": ["ids"]
            })
        );
    }

    #[test]
    fn test_non_exploding_query_is_wrapped() {
        let schema = compile(
            json!([{
                "name": "filter",
                "in": "query",
                "explode": false,
                "required": true,
                "schema": { "type": "object" }
            }]),
            &[],
        );
        assert_eq!(schema["querystring"]["type"], "object");
        assert_eq!(schema["querystring"]["required"], json!(["filter"]));
        assert!(schema["querystring"]["properties"].get("filter").is_some());
    }

    #[test]
    fn test_path_params_always_required() {
        let schema = compile(
            json!([{ "name": "id", "in": "path", "schema": { "type": "string" } }]),
            &["id"],
        );
        assert_eq!(schema["params"]["required"], json!(["id"]));
    }

    #[test]
    fn test_undeclared_template_param_synthesized() {
        let schema = compile(json!([]), &["slug"]);
        assert_eq!(
            schema["params"],
            json!({
                "type": "object",
                "properties": { "slug": { "type": "string" } },
                "required": ["slug"]
            })
        );
    }

    #[test]
    fn test_operation_overrides_path_level() {
        let path_level = json!([
            { "name": "id", "in": "path", "required": true, "schema": { "type": "string" } },
            { "name": "verbose", "in": "query", "schema": { "type": "boolean" } }
        ]);
        let operation_level = json!([
            { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
        ]);

        let merged = merge_parameters(Some(&path_level), Some(&operation_level));
        let mut schema = Map::new();
        apply_parameters(&mut schema, &merged, &["id"]);

        assert_eq!(schema["params"]["properties"]["id"]["type"], "integer");
        assert!(schema["querystring"]["properties"].get("verbose").is_some());
    }

    #[test]
    fn test_refs_and_nameless_skipped() {
        let schema = compile(
            json!([
                { "$ref": "#/components/parameters/Limit" },
                { "in": "query", "schema": { "type": "string" } }
            ]),
            &[],
        );
        assert!(schema.is_empty());
    }
}
