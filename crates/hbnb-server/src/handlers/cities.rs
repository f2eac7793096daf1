//! City handlers

use super::{create_kind, delete_kind, get_kind, public_list, require, update_kind, ApiResult};
use crate::extractors::parse_object;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::EntityKind;
use serde_json::Value;

/// Cities of one state
pub async fn list_of_state(
    State(state): State<AppState>,
    Path(state_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let cities = state
        .catalog
        .children(EntityKind::State, &state_id, EntityKind::City)
        .await?;
    public_list(&cities)
}

pub async fn create_in_state(
    State(state): State<AppState>,
    Path(state_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    state.catalog.fetch(EntityKind::State, &state_id).await?;
    let mut payload = parse_object(&body, false)?;
    require(&payload, "name")?;

    payload.insert("state_id".to_string(), Value::String(state_id));
    create_kind(&state, EntityKind::City, &payload).await
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    get_kind(&state, EntityKind::City, &id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    update_kind(&state, EntityKind::City, &id, &body).await
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    delete_kind(&state, EntityKind::City, &id).await
}
