use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "OK" }))
}

pub async fn ready() -> impl IntoResponse {
    Json(json!({ "status": "OK" }))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "status": "NOT FOUND" })))
}
