//! Application state shared across handlers

use crate::config::Settings;
use crate::metrics::Metrics;
use crate::search::LibrarySearch;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search service
    pub search: Arc<LibrarySearch>,
}

impl AppState {
    pub fn new(settings: Arc<Settings>, search: Arc<LibrarySearch>) -> Self {
        Self { settings, search }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }

    pub fn metrics(&self) -> &Metrics {
        self.search.metrics()
    }

    /// Tenant alias for a request's Host header
    pub fn tenant_for(&self, host: Option<&str>) -> String {
        match host {
            Some(host) => self.settings.tenant_for_host(host).to_string(),
            None => self.settings.server.default_tenant.clone(),
        }
    }
}
