use axum::Json;
use serde_json::{json, Value};

/// GET /
/// Unauthenticated liveness probe returning a static status object.
pub async fn liveness_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "lexiq-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
