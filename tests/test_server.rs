//! Integration test: server API endpoints

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use polars::prelude::*;
use serde_json::{json, Value};
use shopsight::data::{encode, train_test_split, ShopperData};
use shopsight::server::{create_router, AppState, ServerConfig};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> axum::Router {
    let n = 80;
    let page_values: Vec<f64> = (0..n)
        .map(|i| if i % 4 == 0 { 30.0 + (i % 5) as f64 } else { (i % 6) as f64 })
        .collect();
    let bounce: Vec<f64> = (0..n).map(|i| (i % 9) as f64 * 0.01).collect();
    let month: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "Feb" } else { "Nov" }).collect();
    let revenue: Vec<&str> = (0..n)
        .map(|i| if i % 4 == 0 { "Sale" } else { "No Sale" })
        .collect();

    let frame = df!(
        "PageValues" => &page_values,
        "BounceRates" => &bounce,
        "Month" => &month,
        "Revenue" => &revenue
    )
    .unwrap();

    let encoded = encode(&ShopperData { frame }).unwrap();
    let split = train_test_split(&encoded, 0.25, 1).unwrap();

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        data_path: None,
    };
    let state = Arc::new(AppState::new(config, split));
    create_router(state)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dataset_endpoint_reports_split_shapes() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dataset")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["train_rows"], 60);
    assert_eq!(body["test_rows"], 20);
    assert_eq!(body["classes"], json!(["No Sale", "Sale"]));
}

#[tokio::test]
async fn test_experiment_endpoint_returns_report() {
    let app = test_app();
    let payload = json!({
        "strategy": "balanced-forest",
        "params": {
            "max_features_rule": "sqrt",
            "estimator_count": 5,
            "random_seed": 1
        }
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/experiment")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert!(body["run_id"].is_string());
    let score = body["balanced_accuracy"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&score));
    assert_eq!(body["test_shape"]["rows"], 20);
    assert!(body["feature_importance"].is_object());
}

#[tokio::test]
async fn test_experiment_endpoint_rejects_unknown_strategy() {
    let app = test_app();
    let payload = json!({
        "strategy": "quantum-forest",
        "params": {}
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/experiment")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
