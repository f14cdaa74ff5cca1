//! Router assembly and the HTTP server loop

pub mod response;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tower_http::compression::CompressionLayer;

use crate::config::Config;
use crate::db;
use crate::error::AppError;
use crate::features::{self, FeatureState};
use crate::middleware;

/// Full application: `/`, `/health` and every feature under `/api/v1`.
pub fn create_router(state: FeatureState, config: &Config) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health_check))
        .with_state(state.db.clone());

    Router::new()
        .route("/", get(root))
        .merge(health_routes)
        .nest("/api/v1", features::router(state))
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Connect, migrate and serve until a shutdown signal arrives.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = db::create_pool(&config.database).await?;
    db::migrate(&pool).await?;
    tracing::info!("Database migrations completed");

    let state = FeatureState::new(pool, config.ingest, config.auth);
    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "ChemEquip Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health_check(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    db::health_check(&pool).await?;
    Ok(Json(json!({
        "status": "healthy",
        "database": "connected"
    })))
}

async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received terminate signal, starting graceful shutdown"),
    }

    // In-flight uploads commit or roll back on their own; this only bounds
    // how long we linger.
    tracing::info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
