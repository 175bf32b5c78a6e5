//! Configuration for tsquery
//!
//! Centralized configuration with sensible defaults.

use crate::protocol::{TypeRegistry, ValueType};

/// Default tracing filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "warn,tsquery=info";

/// Main configuration
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Codec Configuration
    // -------------------------------------------------------------------------
    /// Field name → type mapping used when parsing lines
    pub registry: TypeRegistry,

    // -------------------------------------------------------------------------
    // Logging Configuration
    // -------------------------------------------------------------------------
    /// Fallback tracing filter directive
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: TypeRegistry::builtin(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Replace the whole type registry
    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.config.registry = registry;
        self
    }

    /// Register or override the type of one field
    pub fn field_type(mut self, field: impl Into<String>, ty: ValueType) -> Self {
        self.config.registry.insert(field, ty);
        self
    }

    /// Set the fallback tracing filter
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = filter.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
