//! Request handlers

use crate::experiment::{run_experiment, ExperimentReport, Strategy};
use crate::server::{AppState, ServerError};
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Health probe
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at,
    }))
}

/// Memoized dataset and split shapes
pub async fn get_dataset_info(State(state): State<Arc<AppState>>) -> Json<Value> {
    let split = &state.split;
    Json(json!({
        "columns": split.columns,
        "classes": split.classes.names(),
        "train_rows": split.x_train.nrows(),
        "test_rows": split.x_test.nrows(),
        "encoded_columns": split.columns.len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ExperimentResponse {
    pub run_id: String,
    #[serde(flatten)]
    pub report: ExperimentReport,
}

/// Run one experiment against the memoized split
pub async fn run_experiment_handler(
    State(state): State<Arc<AppState>>,
    Json(strategy): Json<Strategy>,
) -> Result<Json<ExperimentResponse>, ServerError> {
    let run_id = AppState::generate_run_id();
    info!(run_id = %run_id, strategy = strategy.name(), "experiment requested");

    // Model fitting is CPU-bound; keep it off the async workers.
    let split = state.clone();
    let report = tokio::task::spawn_blocking(move || run_experiment(&split.split, &strategy))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(Json(ExperimentResponse { run_id, report }))
}
