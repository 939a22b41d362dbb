//! Search request and dispatch plan models

use crate::config::BackendSettings;
use uuid::Uuid;

/// A validated search, ready for dispatch.
///
/// Produced only by the query gate. The backend list is fixed here and does
/// not change while the aggregation runs.
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    /// Correlates log lines of one aggregation
    pub request_id: Uuid,
    /// Tenant alias the settings were read for
    pub tenant: String,
    /// Query as supplied by the caller
    pub query: String,
    /// Enabled backends and their settings, unique by identifier
    pub backends: Vec<(String, BackendSettings)>,
}

impl DispatchPlan {
    pub(crate) fn new(
        tenant: impl Into<String>,
        query: impl Into<String>,
        backends: Vec<(String, BackendSettings)>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            tenant: tenant.into(),
            query: query.into(),
            backends,
        }
    }

    /// Identifiers of the backends that will be called
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|(name, _)| name.as_str()).collect()
    }
}
