//! Refresh coordinator
//!
//! One cycle fetches every service's document, compiles and resolves it,
//! checksums the resolved routes and stores the result set in the route
//! cache. Periodic cycles compare each checksum against the previous
//! cycle for that host and hand the new records to the [`Restarter`]
//! when anything changed.

use crate::cache::RouteCache;
use crate::checksum::routes_checksum;
use crate::fetcher::SchemaFetcher;
use crate::restart::Restarter;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use portico_config::Config;
use portico_core::{RefreshRecord, Result, RouteDescriptor, ServiceEntry};
use portico_openapi::{compile, resolve, TagPolicy};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Result of one completed cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    /// One record per service, in declaration order
    pub records: Vec<RefreshRecord>,
    /// At least one service's route set differs from the previous cycle
    pub changed: bool,
    /// Records were read from the route cache instead of fetched
    pub from_cache: bool,
}

/// What a periodic tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A cycle or restart was already in flight
    Skipped,
    /// Cycle completed, no route set changed
    Unchanged,
    /// Cycle detected a change and the restart completed
    Restarted,
    /// Cycle detected a change and the restart failed
    RestartFailed,
    /// Cycle could not complete
    Failed,
}

/// Drives refresh cycles for a fixed set of services
pub struct RefreshCoordinator {
    services: Vec<ServiceEntry>,
    policy: TagPolicy,
    fetcher: Arc<dyn SchemaFetcher>,
    restarter: Arc<dyn Restarter>,
    cache: Option<RouteCache>,
    fetch_concurrency: usize,
    interval: Option<Duration>,
    /// Checksum of the last completed cycle, by host
    checksums: Mutex<HashMap<String, String>>,
    refreshing: AtomicBool,
    restarting: AtomicBool,
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("services", &self.services.len())
            .field("policy", &self.policy)
            .field("cache", &self.cache)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .field("interval", &self.interval)
            .field("refreshing", &self.refreshing)
            .field("restarting", &self.restarting)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    /// Coordinator with the default tag policy, no cache and no periodic
    /// refresh
    pub fn new(
        services: Vec<ServiceEntry>,
        fetcher: Arc<dyn SchemaFetcher>,
        restarter: Arc<dyn Restarter>,
    ) -> Self {
        Self {
            services,
            policy: TagPolicy::default(),
            fetcher,
            restarter,
            cache: None,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            interval: None,
            checksums: Mutex::new(HashMap::new()),
            refreshing: AtomicBool::new(false),
            restarting: AtomicBool::new(false),
        }
    }

    /// Coordinator configured from the gateway, refresh and service
    /// sections
    pub fn from_config(
        config: &Config,
        fetcher: Arc<dyn SchemaFetcher>,
        restarter: Arc<dyn Restarter>,
    ) -> Self {
        let gateway = &config.gateway;
        let policy = TagPolicy::new(gateway.public_tag.clone(), gateway.hidden_tag.clone())
            .hidden_marker(gateway.hidden_marker.clone())
            .expose_docs(gateway.expose_docs)
            .ignore_hidden(gateway.ignore_hidden);

        let refresh = &config.refresh;
        let cache = refresh
            .routes_file
            .clone()
            .map(|path| RouteCache::new(path).ephemeral(refresh.ephemeral_routes_file));

        let mut coordinator = Self::new(config.services.clone(), fetcher, restarter)
            .with_policy(policy)
            .with_fetch_concurrency(refresh.fetch_concurrency)
            .with_interval(refresh.interval);
        coordinator.cache = cache;
        coordinator
    }

    /// Set the gateway-wide tag policy
    pub fn with_policy(mut self, policy: TagPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Store every cycle in `cache`
    pub fn with_cache(mut self, cache: RouteCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Limit concurrent fetches (at least one)
    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }

    /// Delay between periodic cycles
    pub fn with_interval(mut self, interval: Option<Duration>) -> Self {
        self.interval = interval;
        self
    }

    /// Configured services
    pub fn services(&self) -> &[ServiceEntry] {
        &self.services
    }

    /// Tag policy for `service`: gateway defaults with the service's tag
    /// overrides applied
    pub fn policy_for(&self, service: &ServiceEntry) -> TagPolicy {
        let mut policy = self.policy.clone();
        if let Some(tag) = &service.tag {
            policy.public_tag = tag.clone();
        }
        if let Some(tag) = &service.hidden_tag {
            policy.hidden_tag = tag.clone();
        }
        policy
    }

    /// Checksum recorded for `host` by the last completed cycle
    pub fn checksum(&self, host: &str) -> Option<String> {
        self.checksums.lock().get(host).cloned()
    }

    /// True while a periodic cycle is in flight
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// True while a restart is in flight
    pub fn is_restarting(&self) -> bool {
        self.restarting.load(Ordering::Acquire)
    }

    /// Initial load: the route cache when one exists and is readable,
    /// otherwise a live cycle.
    pub async fn load(&self) -> Result<Cycle> {
        if let Some(cache) = &self.cache {
            if cache.exists().await {
                match cache.load().await {
                    Ok(records) => {
                        self.prime(&records)?;
                        info!(
                            path = %cache.path().display(),
                            services = records.len(),
                            "Loaded routes from cache"
                        );
                        return Ok(Cycle {
                            records,
                            changed: false,
                            from_cache: true,
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "Route cache unreadable, fetching schemas");
                    }
                }
            }
        }

        self.run_cycle(false).await
    }

    /// Forced live cycle with change detection
    pub async fn refresh(&self) -> Result<Cycle> {
        self.run_cycle(true).await
    }

    /// Run one cycle. `changed` is only ever set when `reload` is true.
    pub async fn run_cycle(&self, reload: bool) -> Result<Cycle> {
        let fetches: Vec<BoxFuture<'_, Option<Value>>> = self
            .services
            .iter()
            .map(|service| self.fetch_document(service).boxed())
            .collect();
        let documents: Vec<Option<Value>> = stream::iter(fetches)
            .buffered(self.fetch_concurrency)
            .collect()
            .await;

        let mut records = Vec::with_capacity(self.services.len());
        let mut changed = false;

        for (service, document) in self.services.iter().zip(documents) {
            let routes = document.map(|document| self.resolve_routes(service, &document));
            let checksum = routes_checksum(routes.as_deref())?;

            let previous = self
                .checksums
                .lock()
                .insert(service.host.clone(), checksum.clone());
            if reload && previous.as_deref() != Some(checksum.as_str()) {
                debug!(service = %service.host, checksum = %checksum, "Route set changed");
                changed = true;
            }

            records.push(RefreshRecord {
                service: service.clone(),
                routes,
            });
        }

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&records).await {
                warn!(error = %e, "Failed to store route cache");
            }
        }

        info!(
            services = records.len(),
            fallbacks = records.iter().filter(|record| record.is_fallback()).count(),
            reload,
            changed,
            "Refresh cycle completed"
        );

        Ok(Cycle {
            records,
            changed,
            from_cache: false,
        })
    }

    /// One periodic step: run a reload cycle unless one is in flight, and
    /// restart when it detected a change. Both flags are clear when this
    /// returns.
    pub async fn tick(&self) -> TickOutcome {
        if self.restarting.load(Ordering::Acquire) {
            debug!("Restart in progress, skipping refresh");
            return TickOutcome::Skipped;
        }
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Refresh already running, skipping");
            return TickOutcome::Skipped;
        }

        let previous = self.checksums.lock().clone();

        let cycle = match self.run_cycle(true).await {
            Ok(cycle) => cycle,
            Err(e) => {
                error!(error = %e, "Refresh cycle failed");
                self.refreshing.store(false, Ordering::Release);
                return TickOutcome::Failed;
            }
        };

        if !cycle.changed {
            self.refreshing.store(false, Ordering::Release);
            return TickOutcome::Unchanged;
        }

        self.restarting.store(true, Ordering::Release);
        info!(services = cycle.records.len(), "Route set changed, restarting");

        let outcome = match self.restarter.restart(&cycle.records).await {
            Ok(()) => {
                info!("Restart completed");
                TickOutcome::Restarted
            }
            Err(e) => {
                error!(error = %e, "Restart failed, retrying on next tick");
                // The next cycle must see the change again.
                *self.checksums.lock() = previous;
                TickOutcome::RestartFailed
            }
        };

        self.restarting.store(false, Ordering::Release);
        self.refreshing.store(false, Ordering::Release);
        outcome
    }

    /// Spawn the periodic refresh task. Each cycle is scheduled one
    /// interval after the previous one completed. Returns `None` when no
    /// interval is configured.
    pub fn spawn_periodic(
        self: Arc<Self>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Option<JoinHandle<()>> {
        let interval = self.interval?;

        Some(tokio::spawn(async move {
            info!(?interval, "Periodic refresh started");
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        let outcome = self.tick().await;
                        debug!(?outcome, "Refresh tick finished");
                    }
                    _ = shutdown.recv() => {
                        info!("Periodic refresh stopped");
                        break;
                    }
                }
            }
        }))
    }

    /// Teardown: deletes an ephemeral route cache
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(cache) = self.cache.as_ref().filter(|cache| cache.is_ephemeral()) {
            cache.remove().await?;
            info!(path = %cache.path().display(), "Removed route cache");
        }
        Ok(())
    }

    fn prime(&self, records: &[RefreshRecord]) -> Result<()> {
        let mut primed = HashMap::with_capacity(records.len());
        for record in records {
            primed.insert(
                record.service.host.clone(),
                routes_checksum(record.routes.as_deref())?,
            );
        }
        self.checksums.lock().extend(primed);
        Ok(())
    }

    async fn fetch_document(&self, service: &ServiceEntry) -> Option<Value> {
        match self.fetcher.fetch(service).await {
            Ok(document) => Some(document),
            Err(e) if e.is_transport() => {
                warn!(
                    service = %service.host,
                    error = %e,
                    "Schema unavailable, using wildcard fallback"
                );
                None
            }
            Err(e) => {
                error!(
                    service = %service.host,
                    error = %e,
                    "Schema fetch failed, using wildcard fallback"
                );
                None
            }
        }
    }

    fn resolve_routes(&self, service: &ServiceEntry, document: &Value) -> Vec<RouteDescriptor> {
        let compiled = compile(document);
        let routes = resolve(&compiled.routes, &self.policy_for(service));
        debug!(
            service = %service.host,
            compiled = compiled.routes.len(),
            exposed = routes.len(),
            "Resolved routes"
        );
        routes
    }
}
