//! Application state and router.

use axum::{
    Router,
    routing::{get, post},
};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::sessions::BrowserSessions;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// One gate per browser, keyed by the session cookie.
    pub sessions: Arc<BrowserSessions>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(sessions: BrowserSessions) -> Self {
        Self {
            sessions: Arc::new(sessions),
        }
    }
}

/// Builds the router serving the gate.
pub fn router(state: AppState, style_dir: &Path) -> Router {
    Router::new()
        .route("/", get(routes::home))
        .route("/api/state", get(routes::current_state))
        .route("/auth/login", post(routes::login))
        .route("/auth/callback", get(routes::callback))
        .route("/auth/logout", post(routes::logout))
        .nest_service("/style", ServeDir::new(style_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
