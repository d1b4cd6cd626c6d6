use anyhow::{Context, Result};
use camerafy_backend::api::{self, AppState};
use camerafy_backend::config::Config;
use camerafy_backend::store::{MemoryStore, PgStore, Store};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("camerafy_backend=info".parse()?),
        )
        .init();

    info!("Starting Camerafy backend");

    // Load configuration from environment
    let config = Config::from_env()?;

    if config.localizer_api_key.is_none() {
        warn!("LOCALIZER_API_KEY not set, localizer endpoints will reject all requests");
    }
    if config.editor_api_key.is_none() {
        warn!("EDITOR_API_KEY not set, 3D content endpoints only accept active session ids");
    }

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            info!("Connecting to PostgreSQL");
            Arc::new(PgStore::connect(url, config.database_max_connections).await?)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store (data is lost on exit)");
            Arc::new(MemoryStore::new())
        }
    };

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = api::router(AppState::new(store, config));

    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("✓ Listening on {}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}
