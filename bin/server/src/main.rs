use allowgate_core::Result;
use allowgate_server::{
    app::{AppState, router},
    config::ServerConfig,
    error::ServerError,
    sessions::BrowserSessions,
};
use allowgate_supabase::SupabaseClient;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().map_err(|e| ServerError::Config {
        details: e.to_string(),
    })?;
    tracing::info!(bind_addr = %config.bind_addr, origin = %config.origin, "Loaded configuration");

    if config.supabase.session_file().is_some() {
        tracing::warn!("SUPABASE__SESSION_FILE is ignored by the server, set SESSION_DIR instead");
    }
    let client = SupabaseClient::new(config.supabase.clone().with_session_file(None)).map_err(
        |report| ServerError::Supabase {
            details: report.to_string(),
        },
    )?;

    let sessions = BrowserSessions::new(client, config.gate.clone(), config.callback_url())
        .with_session_dir(config.session_dir.clone())
        .with_secure_cookies(config.secure_cookies());
    let state = AppState::new(sessions);
    let sessions = Arc::clone(&state.sessions);

    // Spawn periodic session refresh and idle cleanup task
    let maintained = Arc::clone(&sessions);
    let refresh_interval_secs = config.refresh_interval_seconds.max(1);
    let max_idle = Duration::from_secs(config.session_idle_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(refresh_interval_secs));
        loop {
            interval.tick().await;
            maintained.refresh_expiring().await;
            maintained.evict_idle(max_idle).await;
        }
    });

    let app = router(state, &config.style_dir);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| ServerError::Bind {
            addr: config.bind_addr.to_string(),
            details: e.to_string(),
        })?;

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Serve {
            details: e.to_string(),
        })?;

    sessions.shutdown().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
