use axum::Json;
use serde_json::{json, Value};

/// GET /api/healthy
/// Mounted outside the trace layer so probes don't flood the request log.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "mentor-api"
    }))
}
