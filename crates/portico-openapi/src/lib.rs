//! # Portico OpenAPI
//!
//! Turns a service's OpenAPI 3.x document into gateway route descriptors.
//!
//! - [`compile`] walks a document and produces a [`CompiledSpec`]: one
//!   [`RouteDescriptor`] per operation with a validation schema, security
//!   requirements and an operation id.
//! - [`resolve`] keeps the routes a [`TagPolicy`] exposes and rewrites
//!   their tags for the gateway's own documentation.
//!
//! Both are pure: no I/O, and the input is never modified.
//!
//! [`CompiledSpec`]: portico_core::CompiledSpec
//! [`RouteDescriptor`]: portico_core::RouteDescriptor

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod compiler;
pub mod examples;
pub mod operation;
mod params;
pub mod props;
pub mod resolver;

pub use compiler::{compile, SchemaCompiler};
pub use examples::normalize_examples;
pub use operation::{make_operation_id, make_url, template_params};
pub use props::FieldCopy;
pub use resolver::{
    resolve, Exposure, TagPolicy, DEFAULT_HIDDEN_MARKER, DEFAULT_HIDDEN_TAG, DEFAULT_PUBLIC_TAG,
};
