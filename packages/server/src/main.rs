use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::GzipCompressor;
use common::storage::filesystem::FilesystemContentStore;
use tracing::info;

use server::config::AppConfig;
use server::database::init_db;
use server::files::{ContentDelivery, recompress_all};
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready");

    let compressor = Arc::new(GzipCompressor::new(config.storage.compression_level));
    let store = FilesystemContentStore::new(
        config.storage.root.clone(),
        config.storage.max_upload_size,
        compressor,
    )
    .await
    .context("Failed to open content store")?;
    info!(root = %config.storage.root.display(), "Content store ready");
    let content = ContentDelivery::new(Arc::new(store));

    if config.maintenance.recompress_on_startup {
        let report = recompress_all(&db, &content, config.maintenance.on_error).await?;
        info!(
            processed = report.processed,
            failed = report.failed.len(),
            "Startup recompress complete"
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host / server.port")?;

    let state = AppState {
        db: db.clone(),
        content,
        config,
    };
    let app = server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    db.close().await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
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
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
