//! Review handlers

use super::{
    create_kind, delete_kind, existing_user, get_kind, public_list, require, update_kind,
    ApiResult,
};
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

/// Reviews of one place
pub async fn list_of_place(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let reviews = state
        .catalog
        .children(EntityKind::Place, &place_id, EntityKind::Review)
        .await?;
    public_list(&reviews)
}

pub async fn create_in_place(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    state.catalog.fetch(EntityKind::Place, &place_id).await?;
    let mut payload = parse_object(&body, false)?;
    existing_user(&state, &payload).await?;
    require(&payload, "text")?;

    payload.insert("place_id".to_string(), Value::String(place_id));
    create_kind(&state, EntityKind::Review, &payload).await
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    get_kind(&state, EntityKind::Review, &id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    update_kind(&state, EntityKind::Review, &id, &body).await
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    delete_kind(&state, EntityKind::Review, &id).await
}
