//! In-process reload: re-plan the new records and swap the route table

use async_trait::async_trait;
use portico_core::{RefreshRecord, Result};
use portico_refresh::Restarter;
use portico_router::{RoutePlanner, RouteTable};
use std::sync::Arc;

/// Restarter that replaces the live route table
#[derive(Debug, Clone)]
pub struct TableReloader {
    planner: RoutePlanner,
    table: Arc<RouteTable>,
}

impl TableReloader {
    pub fn new(planner: RoutePlanner, table: Arc<RouteTable>) -> Self {
        Self { planner, table }
    }
}

#[async_trait]
impl Restarter for TableReloader {
    async fn restart(&self, records: &[RefreshRecord]) -> Result<()> {
        let routes = self.planner.plan(records)?;
        self.table.replace(routes);
        Ok(())
    }
}
