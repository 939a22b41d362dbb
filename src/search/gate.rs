//! Precondition checks run before any backend is contacted

use super::error::SearchError;
use super::models::DispatchPlan;
use crate::config::{BackendSettings, ConfigProvider};
use crate::engines::BackendRegistry;
use tracing::debug;

/// Section holding the feature switch
pub const FEATURE_SECTION: &str = "librarysearch";

/// Validates a search request against the tenant configuration
pub struct QueryGate<'a> {
    config: &'a dyn ConfigProvider,
    registry: &'a BackendRegistry,
}

impl<'a> QueryGate<'a> {
    pub fn new(config: &'a dyn ConfigProvider, registry: &'a BackendRegistry) -> Self {
        Self { config, registry }
    }

    /// Run every check in order, stopping at the first failure.
    ///
    /// Each backend's settings are read exactly once, here.
    pub fn validate(&self, tenant: &str, query: &str) -> Result<DispatchPlan, SearchError> {
        if !self.config.get_bool(tenant, FEATURE_SECTION, "enabled") {
            debug!("Library search disabled for tenant {}", tenant);
            return Err(SearchError::FeatureDisabled);
        }

        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery);
        }

        let backends: Vec<(String, BackendSettings)> = self
            .registry
            .iter()
            .map(|backend| {
                let name = backend.name().to_string();
                let settings = BackendSettings::load(self.config, tenant, &name);
                (name, settings)
            })
            .filter(|(_, settings)| settings.enabled)
            .collect();

        if backends.is_empty() {
            debug!("No backends enabled for tenant {}", tenant);
            return Err(SearchError::NoBackendsEnabled);
        }

        Ok(DispatchPlan::new(tenant, query, backends))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.set_value("cam", "librarysearch", "enabled", true);
        settings
    }

    #[test]
    fn test_feature_disabled() {
        let mut settings = settings();
        settings.set_value("cam", "librarysearch", "enabled", false);
        settings.set_value("cam", "summon", "enabled", true);
        let registry = BackendRegistry::with_defaults();

        let gate = QueryGate::new(&settings, &registry);
        assert_eq!(
            gate.validate("cam", "darwin").unwrap_err(),
            SearchError::FeatureDisabled
        );
    }

    #[test]
    fn test_unknown_tenant_is_disabled() {
        let settings = settings();
        let registry = BackendRegistry::with_defaults();

        let gate = QueryGate::new(&settings, &registry);
        assert_eq!(
            gate.validate("oxford", "darwin").unwrap_err(),
            SearchError::FeatureDisabled
        );
    }

    #[test]
    fn test_feature_check_comes_first() {
        let settings = Settings::default();
        let registry = BackendRegistry::with_defaults();

        let gate = QueryGate::new(&settings, &registry);
        assert_eq!(gate.validate("default", "").unwrap_err(), SearchError::FeatureDisabled);
    }

    #[test]
    fn test_invalid_query() {
        let mut settings = settings();
        settings.set_value("cam", "aquabrowser", "enabled", true);
        let registry = BackendRegistry::with_defaults();
        let gate = QueryGate::new(&settings, &registry);

        for query in ["", " ", "\t\n  "] {
            assert_eq!(gate.validate("cam", query).unwrap_err(), SearchError::InvalidQuery);
        }
    }

    #[test]
    fn test_query_check_comes_before_backends() {
        let settings = settings();
        let registry = BackendRegistry::with_defaults();

        let gate = QueryGate::new(&settings, &registry);
        assert_eq!(gate.validate("cam", "  ").unwrap_err(), SearchError::InvalidQuery);
    }

    #[test]
    fn test_no_backends_enabled() {
        let settings = settings();
        let registry = BackendRegistry::with_defaults();

        let gate = QueryGate::new(&settings, &registry);
        assert_eq!(
            gate.validate("cam", "darwin").unwrap_err(),
            SearchError::NoBackendsEnabled
        );
    }

    #[test]
    fn test_plan_contains_exactly_enabled_backends() {
        let registry = BackendRegistry::with_defaults();

        for (aquabrowser, summon) in [(true, false), (false, true), (true, true)] {
            let mut settings = settings();
            settings.set_value("cam", "aquabrowser", "enabled", aquabrowser);
            settings.set_value("cam", "summon", "enabled", summon);

            let plan = QueryGate::new(&settings, &registry)
                .validate("cam", " darwin ")
                .unwrap();

            let mut expected = Vec::new();
            if aquabrowser {
                expected.push("aquabrowser");
            }
            if summon {
                expected.push("summon");
            }
            assert_eq!(plan.backend_names(), expected);
            assert_eq!(plan.query, " darwin ");
            assert_eq!(plan.tenant, "cam");
        }
    }

    #[test]
    fn test_plan_carries_backend_settings() {
        let mut settings = settings();
        settings.set_value("cam", "summon", "enabled", true);
        settings.set_value("cam", "summon", "timeout", 1500u64);
        let registry = BackendRegistry::with_defaults();

        let plan = QueryGate::new(&settings, &registry)
            .validate("cam", "darwin")
            .unwrap();
        let (_, summon) = &plan.backends[0];

        assert_eq!(summon.timeout_ms, 1500);
        assert_eq!(summon.version.as_deref(), Some("/2.0.0/search"));
    }
}
