//! Concurrent dispatch of a query to every enabled backend

use super::models::DispatchPlan;
use crate::config::BackendSettings;
use crate::engines::BackendRegistry;
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::results::{AggregateResult, BackendError, BackendOutcome, Timing};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};

/// Fans a validated plan out to its backends and joins the outcomes
pub struct Aggregator {
    /// HTTP client shared by all backends
    client: HttpClient,
    /// Backend registry
    registry: Arc<BackendRegistry>,
    metrics: Arc<Metrics>,
}

impl Aggregator {
    pub fn new(client: HttpClient, registry: Arc<BackendRegistry>, metrics: Arc<Metrics>) -> Self {
        Self {
            client,
            registry,
            metrics,
        }
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Call every backend in the plan at once and wait for all of them.
    ///
    /// The result holds exactly one entry per planned backend. A backend
    /// failing never affects the others.
    pub async fn execute(&self, plan: &DispatchPlan) -> AggregateResult {
        let span = info_span!("aggregate", request_id = %plan.request_id, tenant = %plan.tenant);

        async {
            info!(
                "Dispatching query to {} backends: {:?}",
                plan.backends.len(),
                plan.backend_names()
            );

            let futures = plan
                .backends
                .iter()
                .map(|(name, settings)| self.search_backend(name, settings, &plan.query));

            let mut aggregate = AggregateResult::new();
            for (name, outcome) in join_all(futures).await {
                if !aggregate.insert(name.clone(), outcome) {
                    warn!("Duplicate outcome for backend {} ignored", name);
                }
            }

            info!(
                "Aggregation finished with {} records, failed: {:?}",
                aggregate.record_count(),
                aggregate.failed()
            );
            aggregate
        }
        .instrument(span)
        .await
    }

    async fn search_backend(
        &self,
        name: &str,
        settings: &BackendSettings,
        query: &str,
    ) -> (String, BackendOutcome) {
        let start = Instant::now();

        let outcome = match self.registry.get(name) {
            Some(backend) => backend.search(&self.client, settings, query).await,
            None => {
                warn!("Backend {} is not registered", name);
                BackendOutcome::Failure(BackendError::new(500, format!("Unknown backend {}", name)))
            }
        };

        self.metrics.record(&Timing {
            backend: name.to_string(),
            time_ms: millis(start.elapsed()),
            success: outcome.is_success(),
        });

        (name.to_string(), outcome)
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
