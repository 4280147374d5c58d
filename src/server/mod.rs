//! shopsight HTTP server
//!
//! Small REST API over the experiment runner. The dataset is loaded,
//! encoded and split exactly once at startup; every request reuses that
//! immutable split, so two clients asking for different strategies are
//! always scored against the same partitions.

mod error;
mod handlers;
mod state;

pub use error::ServerError;
pub use state::AppState;

use crate::cli::prepare_split;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            data_path: std::env::var("DATA_PATH").ok().map(PathBuf::from),
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/dataset", get(handlers::get_dataset_info))
        .route("/experiment", post(handlers::run_experiment_handler))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Load the dataset once and serve until interrupted.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let split = prepare_split(config.data_path.clone())?;
    info!(
        train_rows = split.x_train.nrows(),
        test_rows = split.x_test.nrows(),
        columns = split.columns.len(),
        "dataset memoized"
    );

    let state = Arc::new(AppState::new(config.clone(), split));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
