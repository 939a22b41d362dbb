//! Configuration module for library search
//!
//! Handles loading settings from YAML files and environment variables, and
//! exposes per-tenant lookups through [`ConfigProvider`]. Settings are passed
//! around explicitly; there is no global instance.

mod provider;
mod settings;

pub use provider::{BackendSettings, ConfigProvider, ConfigValue};
pub use settings::*;
