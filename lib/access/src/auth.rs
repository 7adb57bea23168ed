//! Login and allow-list value types exchanged with the collaborators.

use allowgate_core::IdentityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// OAuth identity provider to sign in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    /// Google accounts.
    #[default]
    Google,
}

impl OAuthProvider {
    /// Returns the provider name as the identity service expects it.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Login initiation data for redirecting to the identity provider.
///
/// Success only means the flow started. The resulting session arrives
/// later through the session subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginInitiation {
    /// The URL to send the user to for authentication.
    pub authorization_url: String,
    /// The provider the flow was started for.
    pub provider: OAuthProvider,
}

impl LoginInitiation {
    /// Creates login initiation data.
    #[must_use]
    pub fn new(authorization_url: String, provider: OAuthProvider) -> Self {
        Self {
            authorization_url,
            provider,
        }
    }
}

/// One row of the allow-list table.
///
/// Only the key column is selected; membership is all the gate needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowListRow {
    /// The identity key the row grants access to.
    pub id: IdentityId,
}

impl AllowListRow {
    /// Creates a row for the given identity.
    #[must_use]
    pub fn new(id: impl Into<IdentityId>) -> Self {
        Self { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_defaults_to_google() {
        assert_eq!(OAuthProvider::default(), OAuthProvider::Google);
        assert_eq!(OAuthProvider::Google.to_string(), "google");
    }

    #[test]
    fn provider_deserializes_lowercase() {
        let provider: OAuthProvider = serde_json::from_str("\"google\"").expect("deserialize");
        assert_eq!(provider, OAuthProvider::Google);
    }

    #[test]
    fn rows_decode_from_table_json() {
        let rows: Vec<AllowListRow> =
            serde_json::from_str(r#"[{"id":"u1"}]"#).expect("deserialize");
        assert_eq!(rows, vec![AllowListRow::new("u1")]);
    }
}
