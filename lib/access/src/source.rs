//! Collaborator seams: the session source and the allow-list.
//!
//! Both are external services. These traits let the gate run against the
//! Supabase adapter in production and against in-memory fakes in tests.

use crate::auth::{AllowListRow, LoginInitiation, OAuthProvider};
use crate::error::{LookupError, SessionSourceError};
use crate::session::Session;
use allowgate_core::{IdentityId, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Kind of change reported by the session stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    /// A session was restored from storage.
    InitialSession,
    /// A user signed in.
    SignedIn,
    /// The session ended.
    SignedOut,
    /// The access token was refreshed for the same user.
    TokenRefreshed,
    /// The user's profile changed.
    UserUpdated,
}

/// One notification from the session stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    /// What happened.
    pub event: AuthEvent,
    /// The session after the change. `None` means signed out.
    pub session: Option<Session>,
}

impl AuthChange {
    /// Creates a change notification.
    #[must_use]
    pub fn new(event: AuthEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }
}

/// Callback invoked for every session change.
pub type SessionHandler = Arc<dyn Fn(AuthChange) + Send + Sync>;

/// Guard for a session-stream subscription.
///
/// The handler stays registered until the guard is dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Creates a guard that runs `release` exactly once when dropped.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Unsubscribes now.
    pub fn unsubscribe(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    handlers: BTreeMap<u64, SessionHandler>,
}

/// Registry of session handlers for `SessionSource` implementations.
///
/// Handlers are invoked outside the registry lock, so a handler may
/// subscribe or unsubscribe while being notified.
#[derive(Clone, Default)]
pub struct Listeners {
    registry: Arc<Mutex<ListenerRegistry>>,
}

impl Listeners {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler until the returned guard is dropped.
    pub fn add(&self, handler: SessionHandler) -> Subscription {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.handlers.insert(id, handler);
            id
        };

        let registry = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).handlers.remove(&id);
            }
        })
    }

    /// Delivers a change to every registered handler.
    pub fn emit(&self, change: &AuthChange) {
        let handlers: Vec<SessionHandler> = lock(&self.registry).handlers.values().cloned().collect();
        for handler in handlers {
            handler(change.clone());
        }
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.registry).handlers.len()
    }

    /// Returns true if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}

fn lock(registry: &Mutex<ListenerRegistry>) -> MutexGuard<'_, ListenerRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The identity service's session API.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Returns the session restored at startup, if any.
    async fn current_session(&self) -> Result<Option<Session>, SessionSourceError>;

    /// Registers a handler for every later session change.
    fn subscribe(&self, handler: SessionHandler) -> Subscription;

    /// Starts an OAuth login that returns to `redirect_to`.
    ///
    /// Success means the flow was initiated; completion arrives through
    /// [`SessionSource::subscribe`].
    async fn begin_oauth_login(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<LoginInitiation, SessionSourceError>;

    /// Ends the current session.
    async fn end_session(&self) -> Result<(), SessionSourceError>;
}

/// The remote allow-list table.
#[async_trait]
pub trait AllowList: Send + Sync {
    /// Returns the rows of `table` whose key equals `id`.
    ///
    /// Normally zero or one row; more than one is a data-integrity anomaly.
    async fn lookup_by_id(
        &self,
        table: &str,
        id: &IdentityId,
    ) -> Result<Vec<AllowListRow>, LookupError>;
}
