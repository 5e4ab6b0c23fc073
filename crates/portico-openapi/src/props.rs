//! Declarative field copying between JSON objects

use serde_json::{Map, Value};

/// Copies a fixed list of named fields, and optionally every vendor
/// extension (`x-` prefixed key), from one object to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCopy {
    fields: &'static [&'static str],
    vendor_extensions: bool,
}

/// Fields a path item contributes to every operation on that path
pub const PATH_ITEM_FIELDS: FieldCopy =
    FieldCopy::new(&["summary", "description"]).with_vendor_extensions();

/// Documentation fields copied from an operation into its schema
pub const OPERATION_FIELDS: FieldCopy =
    FieldCopy::new(&["tags", "summary", "description", "operationId"]).with_vendor_extensions();

/// Fields copied from a parameter onto its property schema
pub const PARAMETER_FIELDS: FieldCopy =
    FieldCopy::new(&["description"]).with_vendor_extensions();

/// True for OpenAPI vendor extension keys
pub fn is_vendor_extension(key: &str) -> bool {
    key.starts_with("x-")
}

impl FieldCopy {
    /// Copy exactly `fields`
    pub const fn new(fields: &'static [&'static str]) -> Self {
        Self {
            fields,
            vendor_extensions: false,
        }
    }

    /// Also copy vendor extensions
    pub const fn with_vendor_extensions(mut self) -> Self {
        self.vendor_extensions = true;
        self
    }

    /// Whether `key` is selected by this copy
    pub fn matches(&self, key: &str) -> bool {
        self.fields.contains(&key) || (self.vendor_extensions && is_vendor_extension(key))
    }

    /// Copy the selected fields of `source` into `target`, overwriting
    /// existing keys in place. Iteration follows `source` order.
    pub fn apply(&self, source: &Map<String, Value>, target: &mut Map<String, Value>) {
        for (key, value) in source {
            if self.matches(key) {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}
