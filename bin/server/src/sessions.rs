//! Per-browser gate sessions.
//!
//! Every browser gets its own [`AccessGate`] over its own Supabase session.
//! The browser finds it again through an opaque id in the session cookie.

use allowgate_access::{AccessGate, GateConfig};
use allowgate_supabase::SupabaseClient;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use time::Duration as TimeDuration;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};
use ulid::Ulid;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "allowgate_session";

/// How long the browser keeps the session cookie.
const COOKIE_LIFETIME: TimeDuration = TimeDuration::days(30);

/// One browser's gate and Supabase session.
pub struct BrowserSession {
    id: Ulid,
    gate: AccessGate,
    supabase: Arc<SupabaseClient>,
    last_seen: Mutex<Instant>,
}

impl BrowserSession {
    /// Returns the id carried in the browser's cookie.
    #[must_use]
    pub fn id(&self) -> Ulid {
        self.id
    }

    /// Returns this browser's access gate.
    #[must_use]
    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Returns this browser's Supabase client.
    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.supabase
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let last_seen = *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner);
        now.saturating_duration_since(last_seen)
    }
}

/// All live browser sessions.
pub struct BrowserSessions {
    client: SupabaseClient,
    gate_config: GateConfig,
    redirect_to: String,
    session_dir: Option<PathBuf>,
    secure_cookies: bool,
    entries: RwLock<HashMap<Ulid, Arc<BrowserSession>>>,
}

impl BrowserSessions {
    /// Creates an empty registry.
    ///
    /// Each browser session gets a sibling of `client`, so they share one
    /// connection pool.
    #[must_use]
    pub fn new(
        client: SupabaseClient,
        gate_config: GateConfig,
        redirect_to: impl Into<String>,
    ) -> Self {
        Self {
            client,
            gate_config,
            redirect_to: redirect_to.into(),
            session_dir: None,
            secure_cookies: false,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Keeps each browser's Supabase session in `dir/<id>.json`.
    #[must_use]
    pub fn with_session_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.session_dir = dir;
        self
    }

    /// Sets the `Secure` attribute on the session cookie.
    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Returns the number of live sessions.
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Finds the session for the browser's cookie, starting one if needed.
    ///
    /// A missing, malformed, or unknown id gets a fresh session, and the
    /// returned jar then carries its cookie. An unknown id is kept only if
    /// a session file exists for it.
    pub async fn resolve(&self, jar: CookieJar) -> (CookieJar, Arc<BrowserSession>) {
        let presented = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| Ulid::from_string(cookie.value()).ok());

        if let Some(id) = presented {
            if let Some(session) = self.entries.read().await.get(&id).cloned() {
                session.touch();
                return (jar, session);
            }
        }

        let (session, started) = {
            let mut entries = self.entries.write().await;
            match presented.and_then(|id| entries.get(&id).cloned()) {
                Some(session) => (session, false),
                None => {
                    let id = presented
                        .filter(|id| self.has_stored_session(*id))
                        .unwrap_or_else(Ulid::new);
                    let session = Arc::new(self.start_session(id));
                    entries.insert(id, Arc::clone(&session));
                    (session, true)
                }
            }
        };

        if !started {
            session.touch();
            return (jar, session);
        }

        info!(session = %session.id(), "started browser session");
        // Let the gate restore a stored session before the first render.
        session.gate().settled().await;
        let jar = jar.add(self.cookie(session.id()));
        (jar, session)
    }

    /// Refreshes every session whose token is about to expire.
    pub async fn refresh_expiring(&self) {
        for session in self.snapshot().await {
            match session.supabase().refresh_if_expiring().await {
                Ok(true) => debug!(session = %session.id(), "refreshed expiring session"),
                Ok(false) => {}
                Err(e) => {
                    warn!(session = %session.id(), error = %e, "failed to refresh session");
                }
            }
        }
    }

    /// Drops sessions unused for longer than `max_idle` and returns how
    /// many went.
    ///
    /// Session files stay on disk, so a returning browser picks its
    /// Supabase session up again.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let evicted: Vec<Arc<BrowserSession>> = {
            let mut entries = self.entries.write().await;
            let idle: Vec<Ulid> = entries
                .iter()
                .filter(|(_, session)| session.idle_for(now) > max_idle)
                .map(|(id, _)| *id)
                .collect();
            idle.iter().filter_map(|id| entries.remove(id)).collect()
        };

        let count = evicted.len();
        for session in evicted {
            stop(session).await;
        }
        if count > 0 {
            info!(count, "dropped idle browser sessions");
        }
        count
    }

    /// Stops every session.
    pub async fn shutdown(&self) {
        let sessions: Vec<Arc<BrowserSession>> = self
            .entries
            .write()
            .await
            .drain()
            .map(|(_, session)| session)
            .collect();
        for session in sessions {
            stop(session).await;
        }
    }

    async fn snapshot(&self) -> Vec<Arc<BrowserSession>> {
        self.entries.read().await.values().cloned().collect()
    }

    fn start_session(&self, id: Ulid) -> BrowserSession {
        let supabase = Arc::new(self.client.sibling(self.session_file(id)));
        let gate = AccessGate::start(
            Arc::clone(&supabase),
            Arc::clone(&supabase),
            self.gate_config.clone(),
            self.redirect_to.clone(),
        );
        BrowserSession {
            id,
            gate,
            supabase,
            last_seen: Mutex::new(Instant::now()),
        }
    }

    fn session_file(&self, id: Ulid) -> Option<PathBuf> {
        self.session_dir
            .as_ref()
            .map(|dir| dir.join(format!("{id}.json")))
    }

    fn has_stored_session(&self, id: Ulid) -> bool {
        self.session_file(id).is_some_and(|path| path.exists())
    }

    fn cookie(&self, id: Ulid) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, id.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(COOKIE_LIFETIME)
            .build()
    }
}

async fn stop(session: Arc<BrowserSession>) {
    match Arc::try_unwrap(session) {
        Ok(session) => session.gate.shutdown().await,
        Err(session) => {
            debug!(session = %session.id(), "browser session still in use, dropping it");
        }
    }
}
