//! Sessions observed from the identity service.
//!
//! A session is external proof that one identity authenticated. The gate
//! never creates or validates sessions itself; it only reads the identity
//! out of them. Tokens ride along so adapters can authorize allow-list
//! lookups and refresh or persist the session.

use allowgate_core::IdentityId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::user::AuthUser;

/// How close to expiry a session must be before it is refreshed early.
const REFRESH_MARGIN_SECONDS: i64 = 60;

/// An authenticated session as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for calls made on behalf of the user.
    access_token: String,
    /// Token used to obtain a fresh access token.
    #[serde(default)]
    refresh_token: Option<String>,
    /// When the access token expires.
    expires_at: DateTime<Utc>,
    /// The authenticated user. Absent means the session carries no identity.
    #[serde(default)]
    user: Option<AuthUser>,
}

impl Session {
    /// Creates a session for the given user, valid for `duration`.
    #[must_use]
    pub fn new(access_token: String, user: AuthUser, duration: Duration) -> Self {
        Self {
            access_token,
            refresh_token: None,
            expires_at: Utc::now() + duration,
            user: Some(user),
        }
    }

    /// Creates a session with every field specified.
    ///
    /// Use this when decoding a session from the wire or from storage.
    #[must_use]
    pub fn with_all_fields(
        access_token: String,
        refresh_token: Option<String>,
        expires_at: DateTime<Utc>,
        user: Option<AuthUser>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
            user,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    /// Returns the user, if the session carries one.
    #[must_use]
    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// Returns the user only if it carries a usable identity key.
    #[must_use]
    pub fn identified_user(&self) -> Option<&AuthUser> {
        self.user.as_ref().filter(|user| !user.id().is_blank())
    }

    /// Returns the identity key, if the session carries one.
    #[must_use]
    pub fn identity(&self) -> Option<&IdentityId> {
        self.identified_user().map(AuthUser::id)
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the refresh token, if present.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Returns when the access token expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the access token expires within the refresh margin.
    #[must_use]
    pub fn expires_soon(&self) -> bool {
        Utc::now() + Duration::seconds(REFRESH_MARGIN_SECONDS) >= self.expires_at
    }
}
