//! Tenant configuration lookup

use serde::{Deserialize, Serialize};

/// A single configuration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(u64),
    Str(String),
}

impl ConfigValue {
    /// Convert a YAML scalar; sequences, maps and nulls have no value
    pub fn from_yaml(value: &serde_yaml::Value) -> Option<Self> {
        match value {
            serde_yaml::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_yaml::Value::Number(n) => n.as_u64().map(Self::Int),
            serde_yaml::Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Str(s) => s.trim().parse().ok(),
            Self::Int(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Str(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Str(s) => s.clone(),
        }
    }
}

/// Source of per-tenant settings.
///
/// Lookups are synchronous and keyed by tenant alias, section and field, e.g.
/// `("cam", "summon", "appid")`.
pub trait ConfigProvider: Send + Sync {
    /// Raw value lookup; `None` for unknown tenants or fields
    fn get_value(&self, tenant: &str, section: &str, field: &str) -> Option<ConfigValue>;

    /// Boolean lookup, missing values are `false`
    fn get_bool(&self, tenant: &str, section: &str, field: &str) -> bool {
        self.get_value(tenant, section, field)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn get_u64(&self, tenant: &str, section: &str, field: &str) -> Option<u64> {
        self.get_value(tenant, section, field).and_then(|v| v.as_u64())
    }

    fn get_str(&self, tenant: &str, section: &str, field: &str) -> Option<String> {
        self.get_value(tenant, section, field).map(|v| v.as_string())
    }
}

/// Settings for one backend, read once per request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendSettings {
    pub enabled: bool,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    pub endpoint: String,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub version: Option<String>,
}

impl BackendSettings {
    /// Fallback when a backend has no configured timeout
    pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

    /// Read the section named after `backend` for a tenant
    pub fn load(provider: &dyn ConfigProvider, tenant: &str, backend: &str) -> Self {
        Self {
            enabled: provider.get_bool(tenant, backend, "enabled"),
            timeout_ms: provider
                .get_u64(tenant, backend, "timeout")
                .unwrap_or(Self::DEFAULT_TIMEOUT_MS),
            endpoint: provider
                .get_str(tenant, backend, "endpoint")
                .unwrap_or_default(),
            app_id: provider.get_str(tenant, backend, "appid"),
            app_secret: provider.get_str(tenant, backend, "appsecret"),
            version: provider.get_str(tenant, backend, "version"),
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}
