//! Wire types for the Supabase auth API.

use allowgate_access::{AuthUser, Session};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Lifetime assumed when the token response carries no expiry.
const DEFAULT_LIFETIME_SECONDS: i64 = 3600;

/// Token response from `/auth/v1/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Unix timestamp at which the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub user: Option<WireUser>,
}

/// A user as returned by the auth API.
#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Profile data copied from the identity provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl WireUser {
    /// Converts to the gate's user, preferring `full_name` over `name`.
    #[must_use]
    pub fn into_user(self) -> AuthUser {
        let display_name = self
            .user_metadata
            .full_name
            .or(self.user_metadata.name)
            .filter(|name| !name.trim().is_empty());
        AuthUser::new(self.id)
            .with_email(self.email.filter(|email| !email.trim().is_empty()))
            .with_display_name(display_name)
    }
}

impl TokenResponse {
    /// Converts to a session, resolving the expiry against `now`.
    #[must_use]
    pub fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| {
                now + Duration::seconds(self.expires_in.unwrap_or(DEFAULT_LIFETIME_SECONDS))
            });
        Session::with_all_fields(
            self.access_token,
            self.refresh_token,
            expires_at,
            self.user.map(WireUser::into_user),
        )
    }
}
