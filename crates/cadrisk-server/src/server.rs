//! Server lifecycle: build state, bind, serve until Ctrl-C.

use tokio::net::TcpListener;
use tracing::info;

use cadrisk_config::ServiceConfig;

use crate::error::ServerError;
use crate::routes::router;
use crate::state::AppState;

/// Run the service described by `config` until a shutdown signal arrives.
pub async fn serve(config: ServiceConfig) -> Result<(), ServerError> {
    let state = AppState::from_config(&config)?;
    let app = router(state, &config.server.static_dir);

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .map_err(|source| ServerError::Io {
            context: format!("failed to bind {}", config.server.bind),
            source,
        })?;
    let addr = listener.local_addr().map_err(|source| ServerError::Io {
        context: "failed to read listener address".to_string(),
        source,
    })?;

    info!(
        %addr,
        static_dir = %config.server.static_dir.display(),
        "cadrisk server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|source| ServerError::Io {
            context: "server error".to_string(),
            source,
        })?;

    info!("cadrisk server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
