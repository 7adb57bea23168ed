//! Supabase client implementing the gate's collaborator traits.
//!
//! One client serves both roles: it is the [`SessionSource`] (GoTrue auth
//! API, PKCE login) and the [`AllowList`] (PostgREST table lookup). The
//! lookup is authorized with the current session's token, so both roles
//! share one session slot.

use crate::config::SupabaseConfig;
use crate::error::SupabaseError;
use crate::store::SessionStore;
use crate::wire::TokenResponse;
use allowgate_access::{
    AllowList, AllowListRow, AuthChange, AuthEvent, Listeners, LoginInitiation, LookupError,
    OAuthProvider, Session, SessionHandler, SessionSource, SessionSourceError, Subscription,
};
use allowgate_core::{IdentityId, Result};
use async_trait::async_trait;
use chrono::Utc;
use oauth2::{PkceCodeChallenge, PkceCodeVerifier};
use reqwest::{Client, Url};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

/// Timeout for every request to Supabase.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Default)]
struct SessionSlot {
    current: Option<Session>,
    /// Whether the stored session has been read yet.
    loaded: bool,
}

/// Client for one Supabase project.
pub struct SupabaseClient {
    http: Client,
    base: Url,
    anon_key: String,
    store: Option<SessionStore>,
    session: RwLock<SessionSlot>,
    pending_verifier: Mutex<Option<PkceCodeVerifier>>,
    listeners: Listeners,
}

impl SupabaseClient {
    /// Creates a client, failing if the project URL or anon key is missing.
    pub fn new(config: SupabaseConfig) -> Result<Self, SupabaseError> {
        let base = config.project_url()?;

        let http = Client::builder()
            .user_agent(concat!("allowgate/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SupabaseError::InvalidConfig {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        let store = config.session_file().map(SessionStore::new);
        if let Some(store) = &store {
            info!(path = %store.path().display(), "persisting sessions to file");
        }

        Ok(Self {
            http,
            base,
            anon_key: config.anon_key,
            store,
            session: RwLock::new(SessionSlot::default()),
            pending_verifier: Mutex::new(None),
            listeners: Listeners::new(),
        })
    }

    /// Creates a client for the same project with its own session.
    ///
    /// The HTTP connection pool is shared. The session slot, pending login,
    /// and subscribers start empty.
    #[must_use]
    pub fn sibling(&self, session_file: Option<PathBuf>) -> Self {
        Self {
            http: self.http.clone(),
            base: self.base.clone(),
            anon_key: self.anon_key.clone(),
            store: session_file.map(SessionStore::new),
            session: RwLock::new(SessionSlot::default()),
            pending_verifier: Mutex::new(None),
            listeners: Listeners::new(),
        }
    }

    /// Returns the current session without touching the session file.
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.current.clone()
    }

    /// Builds the provider authorization URL for a PKCE login.
    #[must_use]
    pub fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        challenge: &PkceCodeChallenge,
    ) -> Url {
        let mut url = self.endpoint("auth/v1/authorize");
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", challenge.as_str())
            .append_pair("code_challenge_method", "s256");
        url
    }

    /// Builds the PostgREST query selecting the row keyed by `id`.
    #[must_use]
    pub fn lookup_url(&self, table: &str, id: &IdentityId) -> Url {
        let mut url = self.endpoint(&format!("rest/v1/{table}"));
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("id", &format!("eq.{id}"));
        url
    }

    /// Completes a login by exchanging the callback code for a session.
    ///
    /// Subscribers see the new session as a signed-in event.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<Session, SupabaseError> {
        let verifier = self
            .pending_verifier
            .lock()
            .await
            .take()
            .ok_or(SupabaseError::NoPendingLogin)?;

        let response = self
            .request_token(
                "pkce",
                json!({
                    "auth_code": code,
                    "code_verifier": verifier.secret(),
                }),
            )
            .await?;

        let session = response.into_session(Utc::now());
        info!(
            identity = session.identity().map(IdentityId::as_str),
            "exchanged login code for session"
        );
        self.install(session.clone(), AuthEvent::SignedIn).await;
        Ok(session)
    }

    /// Refreshes the current session.
    ///
    /// Returns `None` when there is no session or it cannot be refreshed.
    /// Subscribers see the new session as a token-refreshed event.
    pub async fn refresh_session(&self) -> Result<Option<Session>, SupabaseError> {
        let refresh_token = {
            let slot = self.session.read().await;
            slot.current
                .as_ref()
                .and_then(Session::refresh_token)
                .map(str::to_string)
        };
        let Some(refresh_token) = refresh_token else {
            debug!("no refreshable session");
            return Ok(None);
        };

        let response = self
            .request_token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;
        let session = response.into_session(Utc::now());
        info!("session refreshed");
        self.install(session.clone(), AuthEvent::TokenRefreshed).await;
        Ok(Some(session))
    }

    /// Refreshes the session if it is about to expire.
    ///
    /// Returns true if a refresh happened.
    pub async fn refresh_if_expiring(&self) -> Result<bool, SupabaseError> {
        let expiring = self
            .session
            .read()
            .await
            .current
            .as_ref()
            .is_some_and(Session::expires_soon);
        if !expiring {
            return Ok(false);
        }
        Ok(self.refresh_session().await?.is_some())
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}/{path}", self.base.path().trim_end_matches('/'));
        url.set_path(&joined);
        url
    }

    async fn request_token(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<TokenResponse, SupabaseError> {
        let mut url = self.endpoint("auth/v1/token");
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        debug!(grant_type, "requesting token");
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SupabaseError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(grant_type, %status, "token request rejected");
            return Err(SupabaseError::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| SupabaseError::Decode {
                reason: e.to_string(),
            })?;
        Ok(token)
    }

    async fn revoke(&self, access_token: &str) -> Result<(), SupabaseError> {
        let response = self
            .http
            .post(self.endpoint("auth/v1/logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| SupabaseError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(())
    }

    async fn install(&self, session: Session, event: AuthEvent) {
        {
            let mut slot = self.session.write().await;
            slot.current = Some(session.clone());
            slot.loaded = true;
        }
        self.persist(&session);
        self.listeners.emit(&AuthChange::new(event, Some(session)));
    }

    fn persist(&self, session: &Session) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(session) {
            warn!(error = %e, "failed to persist session");
        }
    }

    fn forget_stored(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.clear() {
            warn!(error = %e, "failed to remove stored session");
        }
    }

    /// Reads the stored session, refreshing it once if it has expired.
    async fn restore(&self) -> Result<Option<Session>, SupabaseError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let Some(stored) = store.load().map_err(SupabaseError::from)? else {
            return Ok(None);
        };
        if !stored.is_expired() {
            debug!("restored stored session");
            return Ok(Some(stored));
        }

        let Some(refresh_token) = stored.refresh_token() else {
            info!("stored session expired, discarding");
            self.forget_stored();
            return Ok(None);
        };
        match self
            .request_token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(response) => {
                let session = response.into_session(Utc::now());
                self.persist(&session);
                info!("refreshed expired stored session");
                Ok(Some(session))
            }
            Err(report) => {
                warn!(error = %report, "stored session could not be refreshed, discarding");
                self.forget_stored();
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl SessionSource for SupabaseClient {
    async fn current_session(&self) -> Result<Option<Session>, SessionSourceError> {
        let mut slot = self.session.write().await;
        if !slot.loaded {
            slot.current = self.restore().await.map_err(|report| {
                SessionSourceError::RestoreFailed {
                    reason: report.to_string(),
                }
            })?;
            slot.loaded = true;
        }
        Ok(slot.current.clone())
    }

    fn subscribe(&self, handler: SessionHandler) -> Subscription {
        self.listeners.add(handler)
    }

    async fn begin_oauth_login(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<LoginInitiation, SessionSourceError> {
        Url::parse(redirect_to).map_err(|e| SessionSourceError::LoginInitiationFailed {
            provider: provider.to_string(),
            reason: format!("invalid redirect URL '{redirect_to}': {e}"),
        })?;

        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let url = self.authorize_url(provider, redirect_to, &challenge);
        *self.pending_verifier.lock().await = Some(verifier);

        debug!(%provider, "prepared authorization URL");
        Ok(LoginInitiation::new(url.to_string(), provider))
    }

    async fn end_session(&self) -> Result<(), SessionSourceError> {
        let previous = {
            let mut slot = self.session.write().await;
            slot.loaded = true;
            slot.current.take()
        };
        let Some(previous) = previous else {
            debug!("no session to end");
            return Ok(());
        };

        self.forget_stored();
        let remote = self.revoke(previous.access_token()).await;
        self.listeners
            .emit(&AuthChange::new(AuthEvent::SignedOut, None));

        remote.map_err(|report| {
            SessionSourceError::EndSessionFailed {
                reason: report.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl AllowList for SupabaseClient {
    #[instrument(skip(self))]
    async fn lookup_by_id(
        &self,
        table: &str,
        id: &IdentityId,
    ) -> Result<Vec<AllowListRow>, LookupError> {
        let bearer = self
            .session
            .read()
            .await
            .current
            .as_ref()
            .map_or_else(|| self.anon_key.clone(), |s| s.access_token().to_string());

        let response = self
            .http
            .get(self.lookup_url(table, id))
            .header("apikey", &self.anon_key)
            .header("Accept", "application/json")
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| LookupError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let rows = response
            .json::<Vec<AllowListRow>>()
            .await
            .map_err(|e| LookupError::Decode {
                reason: e.to_string(),
            })?;
        debug!(rows = rows.len(), "allow-list lookup answered");
        Ok(rows)
    }
}
