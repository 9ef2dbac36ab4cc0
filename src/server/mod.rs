use crate::config::Config;
use crate::provider::registry::{ProviderContext, ProviderRegistry};
use crate::provider::store::SqliteSummaryStore;
use crate::service::JobService;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use orchestrator_db::pool::DbPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod routes_jobs;
pub mod routes_providers;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub service: Arc<JobService>,
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .merge(routes_jobs::job_routes())
        .merge(routes_providers::provider_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Build the job facade over the built-in providers, bound to `pool`.
pub fn build_service(config: &Config, pool: DbPool) -> JobService {
    let registry = ProviderRegistry::with_builtin_providers(ProviderContext {
        config: Arc::new(config.clone()),
        store: Arc::new(SqliteSummaryStore::new(pool.clone())),
    });
    JobService::new(
        Arc::new(registry),
        pool,
        Duration::from_secs(config.server.request_deadline_secs),
    )
}

/// Start the HTTP server
pub async fn start_server(config: Config, pool: DbPool) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let service = build_service(&config, pool);
    for name in service.provider_names() {
        match service.registry().get(&name) {
            Ok(_) => tracing::info!(provider = %name, "provider enabled"),
            Err(e) => tracing::warn!(provider = %name, error = %e, "provider disabled"),
        }
    }

    let app = create_router(AppContext {
        service: Arc::new(service),
    });

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
