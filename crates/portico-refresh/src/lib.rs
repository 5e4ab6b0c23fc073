//! # Portico Refresh
//!
//! Keeps the gateway's route set in sync with its backing services.
//!
//! - [`SchemaFetcher`]: pulls each service's OpenAPI document
//! - [`routes_checksum`]: content hash used for change detection
//! - [`RouteCache`]: on-disk record of the last completed cycle
//! - [`RefreshCoordinator`]: runs cycles, diffs them, and asks a
//!   [`Restarter`] to reload the gateway when the route set changed

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod cache;
pub mod checksum;
pub mod coordinator;
pub mod fetcher;
pub mod restart;

pub use cache::RouteCache;
pub use checksum::routes_checksum;
pub use coordinator::{Cycle, RefreshCoordinator, TickOutcome};
pub use fetcher::{HttpSchemaFetcher, SchemaFetcher};
pub use restart::Restarter;
