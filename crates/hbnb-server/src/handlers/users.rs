//! User handlers

use super::{create_kind, delete_kind, get_kind, list_kind, require, update_kind, ApiResult};
use crate::extractors::JsonObject;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::EntityKind;
use serde_json::Value;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    list_kind(&state, EntityKind::User).await
}

pub async fn create(
    State(state): State<AppState>,
    JsonObject(payload): JsonObject,
) -> ApiResult<(StatusCode, Json<Value>)> {
    require(&payload, "email")?;
    require(&payload, "password")?;
    create_kind(&state, EntityKind::User, &payload).await
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    get_kind(&state, EntityKind::User, &id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    update_kind(&state, EntityKind::User, &id, &body).await
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    delete_kind(&state, EntityKind::User, &id).await
}
