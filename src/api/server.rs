use axum::{
    Router,
    routing::{any, get},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    services::{health, hit, stats},
    state::AppState,
};
use crate::app::App;
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(hit))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl+C or SIGTERM, then drain and stop the background tasks
///
/// The tasks are stopped only after the listener has drained, so every hit
/// that got a response is in the journal's final flush.
pub async fn run(config: Config) -> Result<(), AnyError> {
    let app = App::start(&config)?;
    let state = AppState::from_app(&app);

    let address = config.server.bind_addr;
    let listener = TcpListener::bind(address).await?;
    info!(%address, window = %config.window.length, "hitcount listening");

    let served = axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    app.shutdown().await?;
    served?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
