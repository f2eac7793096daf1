//! Service status and object counts

use super::{error::ApiError, ApiResult};
use crate::AppState;
use axum::{extract::State, Json};
use hbnb_core::EntityKind;
use serde_json::{json, Map, Value};

pub async fn status() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// Fallback for every unknown route
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let storage = state.catalog.storage();
    let mut counts = Map::new();
    for kind in EntityKind::ALL {
        let count = storage.count(Some(kind)).await?;
        counts.insert(kind.plural().to_string(), json!(count));
    }
    Ok(Json(Value::Object(counts)))
}
