//! # Portico Core
//!
//! Shared data model and error handling for the Portico gateway.
//!
//! This crate provides the types passed between the other crates:
//! - Compiled route descriptors and compiled specs
//! - Service entries and refresh records
//! - Rate-limit descriptors
//! - Error types

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod route;
pub mod service;
pub mod types;

pub use error::{Error, Result};
pub use route::{CompiledSpec, RouteDescriptor, Schema, SecurityRequirement};
pub use service::{RefreshRecord, ServiceEntry, DEFAULT_OPENAPI_URL};
pub use types::{HttpMethod, RateLimit};

