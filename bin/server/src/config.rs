//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested
//! sections use `__` as the separator, e.g. `SUPABASE__URL` or
//! `GATE__LOOKUP_TIMEOUT_SECONDS`.

use allowgate_access::GateConfig;
use allowgate_supabase::SupabaseConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Public origin of the site. Login redirects come back here.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Interval between session refresh checks, in seconds.
    #[serde(default = "default_refresh_interval_seconds")]
    pub refresh_interval_seconds: u64,

    /// Directory for per-browser session files. Without one, sessions
    /// live only as long as the process.
    #[serde(default)]
    pub session_dir: Option<PathBuf>,

    /// How long a browser session may sit unused before it is dropped
    /// from memory, in seconds.
    #[serde(default = "default_session_idle_seconds")]
    pub session_idle_seconds: u64,

    /// Directory holding the stylesheet.
    #[serde(default = "default_style_dir")]
    pub style_dir: PathBuf,

    /// Supabase project settings.
    #[serde(default)]
    pub supabase: SupabaseConfig,

    /// Access gate settings.
    #[serde(default)]
    pub gate: GateConfig,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_origin() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_refresh_interval_seconds() -> u64 {
    30
}

fn default_session_idle_seconds() -> u64 {
    60 * 60 * 24
}

fn default_style_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/style"))
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Where the identity provider sends the user after login.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.origin.trim_end_matches('/'))
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.origin.starts_with("https://")
    }
}
