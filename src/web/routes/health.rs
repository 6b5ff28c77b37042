use axum::Json;
use serde_json::{json, Value};

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "build": env!("FRIENDS_MANAGEMENT_BUILD_ID"),
    }))
}
