//! The user carried by an authenticated session.
//!
//! Users are owned by the identity service. The gate only observes them and
//! keys every allow-list decision on [`AuthUser::id`].

use allowgate_core::IdentityId;
use serde::{Deserialize, Serialize};

/// The identity behind a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Stable identity key from the identity service.
    id: IdentityId,
    /// Email address, if the provider shared one.
    #[serde(default)]
    email: Option<String>,
    /// Display name from the provider profile (e.g. Google `full_name`).
    #[serde(default)]
    display_name: Option<String>,
}

impl AuthUser {
    /// Creates a user with only an identity key.
    #[must_use]
    pub fn new(id: impl Into<IdentityId>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name;
        self
    }

    /// Returns the identity key.
    #[must_use]
    pub fn id(&self) -> &IdentityId {
        &self.id
    }

    /// Returns the email address, if available.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the display name, if available.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Name to greet the user with: display name, then email, then "User".
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.email())
            .unwrap_or("User")
    }
}
