//! # Portico Router
//!
//! Turns refresh records into the routes the proxy engine registers:
//! - [`RoutePlanner`]: URL prefixing, rate-limit precedence, body limits,
//!   auth policy and the wildcard fallback for schema-less services
//! - [`UpstreamTarget`]: request path rewriting towards the service
//! - [`RouteTable`]: the live route set, replaced atomically on reload

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod planner;
pub mod route;
pub mod table;

pub use planner::{RoutePlanner, DEFAULT_BODY_LIMIT, RATE_LIMIT_EXTENSION};
pub use route::{GatewayRoute, RouteBuilder, UpstreamTarget, WILDCARD_PATH};
pub use table::RouteTable;
