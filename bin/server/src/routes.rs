//! Routes for the gate's pages, login, callback, and logout.
//!
//! Every handler resolves the browser's own session from its cookie first.

use axum::{
    Json,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::app::AppState;
use crate::view::render_page;

/// Query parameters for the login callback.
///
/// Supabase sends `code` on success and `error`/`error_description` when
/// the provider refused the login.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Renders the view for this browser's gate state.
pub async fn home(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar).await;
    (jar, Html(render_page(&session.gate().state())))
}

/// Returns this browser's gate state as JSON.
pub async fn current_state(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar).await;
    (jar, Json(session.gate().state()))
}

/// Starts the OAuth login by redirecting to the identity provider.
pub async fn login(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar).await;
    let redirect = match session.gate().login().await {
        Some(initiation) => Redirect::to(&initiation.authorization_url),
        // Already admitted, or the page shows the login-failure notice.
        None => Redirect::to("/"),
    };
    (jar, redirect)
}

/// Completes the login after the identity provider redirects back.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar).await;

    match (query.code, query.error) {
        (Some(code), _) => match session.supabase().exchange_code(&code).await {
            Ok(_) => tracing::debug!(session = %session.id(), "login code exchanged"),
            Err(report) => {
                tracing::error!(session = %session.id(), error = %report, "login code exchange failed");
                session.gate().report_login_failure();
            }
        },
        (None, error) => {
            tracing::warn!(
                session = %session.id(),
                error = error.as_deref().unwrap_or("missing code"),
                description = query.error_description.as_deref(),
                "identity provider returned without a code"
            );
            session.gate().report_login_failure();
        }
    }

    // Let the gate pick up the outcome before the page renders.
    session.gate().settled().await;
    (jar, Redirect::to("/"))
}

/// Ends the session and returns to the login view.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar).await;
    session.gate().logout().await;
    (jar, Redirect::to("/"))
}
