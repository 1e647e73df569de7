//! # ipr-api - Binary Entry Point
//!
//! Starts the Axum HTTP server for the IPR registry.
//! Binds to configurable port (default 8080).

use ipr_api::state::{AppConfig, LogFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let port = config.port;

    // Absent DATABASE_URL means in-memory only.
    let db_pool = ipr_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let state = ipr_api::bootstrap::bootstrap(config, db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Bootstrap failed: {e}");
            e
        })?;

    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    let app = ipr_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("IPR registry listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
