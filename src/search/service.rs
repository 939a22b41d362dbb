//! Entry point combining the query gate and the aggregator

use super::error::SearchError;
use super::executor::Aggregator;
use super::gate::QueryGate;
use crate::config::ConfigProvider;
use crate::metrics::Metrics;
use crate::results::AggregateResult;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Multi-tenant library search.
///
/// Validates a query against the tenant configuration, then fans it out to
/// every enabled backend and joins the outcomes.
pub struct LibrarySearch {
    config: Arc<dyn ConfigProvider>,
    aggregator: Aggregator,
    metrics: Arc<Metrics>,
}

impl LibrarySearch {
    pub fn new(config: Arc<dyn ConfigProvider>, aggregator: Aggregator, metrics: Arc<Metrics>) -> Self {
        Self {
            config,
            aggregator,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Search every enabled backend for a tenant.
    ///
    /// A precondition failure is returned before any backend is contacted.
    /// Otherwise the aggregate holds one entry per enabled backend, whether
    /// its call succeeded or not.
    pub async fn perform_search(
        &self,
        tenant: &str,
        query: &str,
    ) -> Result<AggregateResult, SearchError> {
        let plan = match QueryGate::new(self.config.as_ref(), self.aggregator.registry())
            .validate(tenant, query)
        {
            Ok(plan) => plan,
            Err(e) => {
                debug!("Search rejected for tenant {}: {}", tenant, e);
                self.metrics.inc_rejected();
                return Err(e);
            }
        };

        info!(
            "Search '{}' for tenant {} ({})",
            plan.query, plan.tenant, plan.request_id
        );
        self.metrics.inc_search();

        Ok(self.aggregator.execute(&plan).await)
    }

    /// Run a search in the background and hand its result to `on_complete`.
    ///
    /// The callback runs exactly once unless the returned handle is aborted
    /// first, in which case it never runs.
    pub fn spawn_search<F>(
        self: &Arc<Self>,
        tenant: impl Into<String>,
        query: impl Into<String>,
        on_complete: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<AggregateResult, SearchError>) + Send + 'static,
    {
        let search = Arc::clone(self);
        let tenant = tenant.into();
        let query = query.into();

        tokio::spawn(async move {
            let result = search.perform_search(&tenant, &query).await;
            on_complete(result);
        })
    }
}
