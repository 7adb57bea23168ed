//! Access gate configuration.
//!
//! Every field has a default, so the whole section may be omitted when
//! loading configuration from the environment.

use crate::auth::OAuthProvider;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the access gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Table holding the allow-list, keyed by identity id.
    /// Default: "profiles"
    #[serde(default = "default_allow_list_table")]
    allow_list_table: String,
    /// OAuth provider used by `login`.
    /// Default: "google"
    #[serde(default)]
    provider: OAuthProvider,
    /// Upper bound on a single allow-list lookup, in seconds. 0 disables it.
    /// Default: 10
    #[serde(default = "default_lookup_timeout_seconds")]
    lookup_timeout_seconds: u64,
}

fn default_allow_list_table() -> String {
    "profiles".to_string()
}

fn default_lookup_timeout_seconds() -> u64 {
    10
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            allow_list_table: default_allow_list_table(),
            provider: OAuthProvider::default(),
            lookup_timeout_seconds: default_lookup_timeout_seconds(),
        }
    }
}

impl GateConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> GateConfigBuilder {
        GateConfigBuilder::default()
    }

    /// Returns the allow-list table name.
    #[must_use]
    pub fn allow_list_table(&self) -> &str {
        &self.allow_list_table
    }

    /// Returns the OAuth provider.
    #[must_use]
    pub fn provider(&self) -> OAuthProvider {
        self.provider
    }

    /// Returns the lookup timeout, or `None` if lookups may wait forever.
    #[must_use]
    pub fn lookup_timeout(&self) -> Option<Duration> {
        (self.lookup_timeout_seconds > 0).then(|| Duration::from_secs(self.lookup_timeout_seconds))
    }
}

/// Builder for `GateConfig`.
#[derive(Debug, Default)]
pub struct GateConfigBuilder {
    config: GateConfig,
}

impl GateConfigBuilder {
    /// Sets the allow-list table name.
    #[must_use]
    pub fn allow_list_table(mut self, table: impl Into<String>) -> Self {
        self.config.allow_list_table = table.into();
        self
    }

    /// Sets the OAuth provider.
    #[must_use]
    pub fn provider(mut self, provider: OAuthProvider) -> Self {
        self.config.provider = provider;
        self
    }

    /// Sets the lookup timeout in seconds. 0 disables it.
    #[must_use]
    pub fn lookup_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.lookup_timeout_seconds = seconds;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> GateConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GateConfig::default();
        assert_eq!(config.allow_list_table(), "profiles");
        assert_eq!(config.provider(), OAuthProvider::Google);
        assert_eq!(config.lookup_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = GateConfig::builder().lookup_timeout_seconds(0).build();
        assert_eq!(config.lookup_timeout(), None);
    }

    #[test]
    fn builder_overrides_table() {
        let config = GateConfig::builder().allow_list_table("members").build();
        assert_eq!(config.allow_list_table(), "members");
    }

    #[test]
    fn empty_section_deserializes_to_defaults() {
        let config: GateConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config, GateConfig::default());
    }
}
