//! Supabase project settings.

use crate::error::SupabaseError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Connection settings for a Supabase project.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`.
    #[serde(default)]
    pub url: String,
    /// The project's public anon key.
    #[serde(default)]
    pub anon_key: String,
    /// Where to keep the session between restarts. No file means sessions
    /// live only as long as the process.
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

impl SupabaseConfig {
    /// Creates settings for the given project.
    #[must_use]
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            session_file: None,
        }
    }

    /// Sets the session file.
    #[must_use]
    pub fn with_session_file(mut self, path: Option<PathBuf>) -> Self {
        self.session_file = path;
        self
    }

    /// Returns the session file, if one is configured.
    #[must_use]
    pub fn session_file(&self) -> Option<&Path> {
        self.session_file.as_deref()
    }

    /// Checks that both the URL and the anon key are present and returns
    /// the parsed project URL.
    pub fn project_url(&self) -> Result<Url, SupabaseError> {
        let url = self.url.trim();
        if url.is_empty() || self.anon_key.trim().is_empty() {
            return Err(SupabaseError::InvalidConfig {
                reason: "missing Supabase URL or anon key".to_string(),
            });
        }

        let parsed = Url::parse(url.trim_end_matches('/')).map_err(|e| {
            SupabaseError::InvalidConfig {
                reason: format!("invalid Supabase URL '{url}': {e}"),
            }
        })?;
        if parsed.cannot_be_a_base() {
            return Err(SupabaseError::InvalidConfig {
                reason: format!("Supabase URL '{url}' cannot be a base URL"),
            });
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_url_parses() {
        let config = SupabaseConfig::new("https://abc.supabase.co/", "anon");
        let url = config.project_url().unwrap();
        assert_eq!(url.host_str(), Some("abc.supabase.co"));
    }

    #[test]
    fn missing_url_or_key_is_rejected() {
        for config in [
            SupabaseConfig::new("", "anon"),
            SupabaseConfig::new("https://abc.supabase.co", "  "),
        ] {
            assert!(matches!(
                config.project_url(),
                Err(SupabaseError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn malformed_url_is_rejected() {
        let config = SupabaseConfig::new("not a url", "anon");
        assert!(matches!(
            config.project_url(),
            Err(SupabaseError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn session_file_defaults_to_none() {
        let config: SupabaseConfig =
            serde_json::from_str(r#"{"url":"https://abc.supabase.co","anon_key":"k"}"#).unwrap();
        assert!(config.session_file().is_none());
    }
}
