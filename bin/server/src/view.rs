//! Server-rendered views for each gate phase.

use allowgate_access::{AuthUser, DenialReason, GateState, GateStatus, Notice};
use leptos::prelude::*;

/// Renders the full HTML document for the given state.
pub fn render_page(state: &GateState) -> String {
    let state = state.clone();
    let owner = Owner::new();
    let html = owner.with(|| view! { <Document state=state/> }.to_html());
    format!("<!DOCTYPE html>{html}")
}

#[component]
fn Document(state: GateState) -> impl IntoView {
    // Poll while a check is running so the verdict shows up on its own.
    let pending = state.in_flight().is_some();

    view! {
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                {pending.then(|| view! { <meta http-equiv="refresh" content="1"/> })}
                <title>"allowgate"</title>
                <link rel="stylesheet" href="/style/main.css"/>
            </head>
            <body>
                <div class="login-container">
                    <GateView state=state/>
                </div>
            </body>
        </html>
    }
}

/// The view for the current phase.
#[component]
pub fn GateView(state: GateState) -> impl IntoView {
    match state.status().clone() {
        GateStatus::SignedOut { notice } => {
            view! { <LoginView notice=notice loading=false/> }.into_any()
        }
        GateStatus::Checking if state.awaiting_provider() => {
            view! {
                <LoginView notice=None loading=true/>
                <form method="post" action="/auth/logout">
                    <button type="submit" class="link-button">"Cancel"</button>
                </form>
            }
            .into_any()
        }
        GateStatus::Checking => view! { <LoginView notice=None loading=true/> }.into_any(),
        GateStatus::Admitted { user } => view! { <HomeView user=user/> }.into_any(),
        GateStatus::Denied { reason } => view! { <DeniedView reason=reason/> }.into_any(),
    }
}

/// Login screen, also shown while signing in.
#[component]
fn LoginView(notice: Option<Notice>, loading: bool) -> impl IntoView {
    let status = if loading {
        Some(("status", "Signing in…"))
    } else {
        notice.map(|notice| ("status error-message", notice.message()))
    };

    view! {
        <h2>"Login"</h2>
        <form method="post" action="/auth/login">
            <button type="submit" class="google-button" disabled=loading>
                "Sign in with Google"
            </button>
        </form>
        {status.map(|(class, text)| view! { <p class=class>{text}</p> })}
    }
}

#[component]
fn HomeView(user: AuthUser) -> impl IntoView {
    let greeting = format!("Welcome, {}!", user.greeting_name());

    view! {
        <h2>"Home"</h2>
        <p>{greeting}</p>
        <form method="post" action="/auth/logout">
            <button type="submit">"Logout"</button>
        </form>
    }
}

#[component]
fn DeniedView(reason: DenialReason) -> impl IntoView {
    if reason.is_verdict() {
        view! {
            <h2>"Access Denied"</h2>
            <p class="error-message">{reason.message()}</p>
            <form method="post" action="/auth/logout">
                <button type="submit">"Try Again"</button>
            </form>
        }
        .into_any()
    } else {
        view! {
            <h2>"Unable to Verify Access"</h2>
            <p class="error-message">{reason.message()}</p>
            <form method="post" action="/auth/login">
                <button type="submit">"Sign in again"</button>
            </form>
        }
        .into_any()
    }
}
