use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use serde_json::{json, Value};

pub(crate) fn routes() -> Router {
    Router::new() //
        .route("/", get(index))
        .route("/health", get(health))
}

async fn index() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "time": Utc::now(),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
