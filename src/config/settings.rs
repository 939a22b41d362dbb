//! Settings structures for library search configuration

use super::provider::{ConfigProvider, ConfigValue};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Raw per-tenant overrides: section -> field -> value
pub type TenantOverrides = HashMap<String, HashMap<String, serde_yaml::Value>>;

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    /// Backend identifiers to load, in dispatch order
    pub backends: Vec<String>,
    /// Values used when a tenant does not override a field
    pub defaults: TenantDefaults,
    /// Known tenants and their overrides
    pub tenants: HashMap<String, TenantOverrides>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut settings = Self {
            general: GeneralSettings::default(),
            server: ServerSettings::default(),
            outgoing: OutgoingSettings::default(),
            backends: vec!["aquabrowser".to_string(), "summon".to_string()],
            defaults: TenantDefaults::default(),
            tenants: HashMap::new(),
        };
        settings.ensure_default_tenant();
        settings
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut settings: Settings = serde_yaml::from_str(content)?;
        settings.ensure_default_tenant();
        Ok(settings)
    }

    /// Merge with environment variables (LIBRARYSEARCH_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("LIBRARYSEARCH_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("LIBRARYSEARCH_LOG") {
            self.general.log_filter = val;
        }
        if let Ok(val) = std::env::var("LIBRARYSEARCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("LIBRARYSEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("LIBRARYSEARCH_DEFAULT_TENANT") {
            self.server.default_tenant = val;
            self.ensure_default_tenant();
        }
    }

    /// Set a single tenant value, registering the tenant if needed
    pub fn set_value(
        &mut self,
        tenant: &str,
        section: &str,
        field: &str,
        value: impl Into<serde_yaml::Value>,
    ) {
        self.tenants
            .entry(tenant.to_string())
            .or_default()
            .entry(section.to_string())
            .or_default()
            .insert(field.to_string(), value.into());
    }

    /// Register a tenant that only uses the defaults
    pub fn add_tenant(&mut self, tenant: &str) {
        self.tenants.entry(tenant.to_string()).or_default();
    }

    /// Resolve a request host to a tenant alias
    pub fn tenant_for_host(&self, host: &str) -> &str {
        let host = strip_port(host);
        self.server
            .tenant_hosts
            .get(host)
            .map(|s| s.as_str())
            .unwrap_or(&self.server.default_tenant)
    }

    fn ensure_default_tenant(&mut self) {
        let default_tenant = self.server.default_tenant.clone();
        self.add_tenant(&default_tenant);
    }
}

/// Drop a trailing `:port`. Bracketed IPv6 hosts keep their brackets.
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        // A bare IPv6 address has no port to strip
        Some((name, _)) if !name.contains(':') => name,
        _ => host,
    }
}

impl ConfigProvider for Settings {
    fn get_value(&self, tenant: &str, section: &str, field: &str) -> Option<ConfigValue> {
        let overrides = self.tenants.get(tenant)?;

        let overridden = overrides
            .get(section)
            .and_then(|fields| fields.get(field))
            .and_then(ConfigValue::from_yaml);

        overridden.or_else(|| self.defaults.get(section, field))
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug mode
    pub debug: bool,
    /// Instance name reported by the health endpoint
    pub instance_name: String,
    /// tracing-subscriber filter directive
    pub log_filter: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "LibrarySearch".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
    /// Tenant used when the request host is not mapped
    pub default_tenant: String,
    /// Host name -> tenant alias
    pub tenant_hosts: HashMap<String, String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
            default_tenant: "default".to_string(),
            tenant_hosts: HashMap::new(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Upper bound for any backend request, in seconds
    pub request_timeout: f64,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// User agent sent to backends
    pub user_agent: String,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 30.0,
            pool_maxsize: 20,
            verify_ssl: true,
            user_agent: format!("library-search/{}", crate::VERSION),
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Default values for every tenant section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantDefaults {
    pub librarysearch: FeatureDefaults,
    pub aquabrowser: AquabrowserDefaults,
    pub summon: SummonDefaults,
}

impl TenantDefaults {
    /// Look up a default by section and field name
    pub fn get(&self, section: &str, field: &str) -> Option<ConfigValue> {
        let value = match (section, field) {
            ("librarysearch", "enabled") => ConfigValue::Bool(self.librarysearch.enabled),

            ("aquabrowser", "enabled") => ConfigValue::Bool(self.aquabrowser.enabled),
            ("aquabrowser", "timeout") => ConfigValue::Int(self.aquabrowser.timeout),
            ("aquabrowser", "endpoint") => ConfigValue::Str(self.aquabrowser.endpoint.clone()),

            ("summon", "enabled") => ConfigValue::Bool(self.summon.enabled),
            ("summon", "timeout") => ConfigValue::Int(self.summon.timeout),
            ("summon", "appid") => ConfigValue::Str(self.summon.appid.clone()),
            ("summon", "appsecret") => ConfigValue::Str(self.summon.appsecret.clone()),
            ("summon", "endpoint") => ConfigValue::Str(self.summon.endpoint.clone()),
            ("summon", "version") => ConfigValue::Str(self.summon.version.clone()),

            _ => return None,
        };
        Some(value)
    }
}

/// Feature switch for the whole aggregation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureDefaults {
    pub enabled: bool,
}

/// Aquabrowser (SRU) backend defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AquabrowserDefaults {
    pub enabled: bool,
    /// Request timeout in milliseconds
    pub timeout: u64,
    /// SRU endpoint, including the trailing `?`
    pub endpoint: String,
}

impl Default for AquabrowserDefaults {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout: 5000,
            endpoint: "http://search.lib.cam.ac.uk/sru.ashx?".to_string(),
        }
    }
}

/// Summon backend defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummonDefaults {
    pub enabled: bool,
    /// Request timeout in milliseconds
    pub timeout: u64,
    pub appid: String,
    pub appsecret: String,
    /// API host, without scheme
    pub endpoint: String,
    /// API version path
    pub version: String,
}

impl Default for SummonDefaults {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout: 10000,
            appid: String::new(),
            appsecret: String::new(),
            endpoint: "api.summon.serialssolutions.com".to_string(),
            version: "/2.0.0/search".to_string(),
        }
    }
}
