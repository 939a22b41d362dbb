//! Backend loader for building the registry from configuration

use super::registry::BackendRegistry;
use super::traits::Backend;
use super::{aquabrowser, summon};
use crate::config::Settings;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing backends from configuration
pub struct BackendLoader;

impl BackendLoader {
    /// Load the backends listed in settings
    pub fn load(settings: &Settings) -> Result<BackendRegistry> {
        let mut registry = BackendRegistry::new();

        for kind in &settings.backends {
            match Self::create_backend(kind) {
                Ok(backend) => {
                    info!("Loaded backend: {}", kind);
                    registry.register(backend);
                }
                Err(e) => {
                    warn!(
                        "Failed to load backend {}: {} (available: {:?})",
                        kind,
                        e,
                        Self::available_backends()
                    );
                }
            }
        }

        if registry.is_empty() {
            return Err(anyhow::anyhow!("No search backends could be loaded"));
        }

        info!("Loaded {} backends", registry.len());
        Ok(registry)
    }

    /// Create a backend instance by identifier
    fn create_backend(kind: &str) -> Result<Arc<dyn Backend>> {
        let backend: Arc<dyn Backend> = match kind {
            "aquabrowser" => Arc::new(aquabrowser::Aquabrowser::new()),
            "summon" => Arc::new(summon::Summon::new()),
            _ => {
                return Err(anyhow::anyhow!("Unknown backend type: {}", kind));
            }
        };

        Ok(backend)
    }

    /// Get list of available backend types
    pub fn available_backends() -> Vec<&'static str> {
        vec!["aquabrowser", "summon"]
    }
}
