//! Live route table

use crate::route::GatewayRoute;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The route set currently registered with the proxy engine. Readers get
/// a consistent snapshot; a reload replaces the whole set at once.
#[derive(Debug)]
pub struct RouteTable {
    routes: ArcSwap<Vec<GatewayRoute>>,
    generation: AtomicU64,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RouteTable {
    /// Table holding `routes`
    pub fn new(routes: Vec<GatewayRoute>) -> Self {
        Self {
            routes: ArcSwap::from_pointee(routes),
            generation: AtomicU64::new(0),
        }
    }

    /// Current routes
    pub fn snapshot(&self) -> Arc<Vec<GatewayRoute>> {
        self.routes.load_full()
    }

    /// Replace every route, returning the previous set
    pub fn replace(&self, routes: Vec<GatewayRoute>) -> Arc<Vec<GatewayRoute>> {
        let previous = self.routes.swap(Arc::new(routes));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(
            generation,
            routes = self.routes.load().len(),
            previous = previous.len(),
            "Route table replaced"
        );
        previous
    }

    /// Number of replacements since creation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Number of routes
    pub fn len(&self) -> usize {
        self.routes.load().len()
    }

    /// True when no routes are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::UpstreamTarget;
    use portico_core::HttpMethod;

    fn route(url: &str) -> GatewayRoute {
        GatewayRoute::builder()
            .method(HttpMethod::Get)
            .url(url)
            .body_limit(1024)
            .upstream(UpstreamTarget {
                host: "http://users:3000".to_string(),
                remote_base_url: None,
                gw_base_url: None,
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_replace_swaps_whole_set() {
        let table = RouteTable::new(vec![route("/a"), route("/b")]);
        let before = table.snapshot();

        let previous = table.replace(vec![route("/c")]);

        assert_eq!(previous.len(), 2);
        assert_eq!(before.len(), 2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.snapshot()[0].url, "/c");
        assert_eq!(table.generation(), 1);
    }

    #[test]
    fn test_default_is_empty() {
        let table = RouteTable::default();
        assert!(table.is_empty());
        assert_eq!(table.generation(), 0);
    }

    #[test]
    fn test_concurrent_readers_see_complete_sets() {
        let table = Arc::new(RouteTable::new(vec![route("/a")]));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let len = table.snapshot().len();
                        assert!(len == 1 || len == 3);
                    }
                })
            })
            .collect();

        for _ in 0..100 {
            table.replace(vec![route("/x"), route("/y"), route("/z")]);
            table.replace(vec![route("/a")]);
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
