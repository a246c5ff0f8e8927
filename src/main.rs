//! Notify Hub - Binary Entry Point

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use notify_hub::{create_router, AppState, ServerConfig};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notify_hub=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let state = Arc::new(AppState::new(&config));

    let seeded = state.auth.seed_admins(&state.store, &config.admins);
    if seeded > 0 {
        info!(count = seeded, "seeded admin accounts");
    }

    tokio::spawn(purge_sessions(state.clone()));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, version = notify_hub::VERSION, scope = ?config.hub.scope, "server listening");

    axum::serve(listener, create_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    info!("server stopped");
    Ok(())
}

/// Periodically drop expired sessions
async fn purge_sessions(state: Arc<AppState>) {
    let mut timer = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        timer.tick().await;
        let purged = state.sessions.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "expired sessions removed");
        }
    }
}

/// Wait for Ctrl-C or SIGTERM, then close every push connection
async fn shutdown_signal(state: Arc<AppState>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    let closed = state.registry().close_all();
    info!(closed, "shutting down, push connections closed");
}
