//! HTTP handlers

pub mod amenities;
pub mod cities;
pub mod error;
pub mod index;
pub mod place_amenities;
pub mod places;
pub mod reviews;
pub mod states;
pub mod users;

use crate::extractors::parse_object;
use crate::AppState;
use axum::{body::Bytes, http::StatusCode, Json};
use error::ApiError;
use hbnb_core::{Entity, EntityKind, View};
use serde_json::{json, Map, Value};

pub type ApiResult<T> = Result<T, ApiError>;

/// The API form of an entity (never carries a password)
pub(crate) fn public(entity: &Entity) -> ApiResult<Value> {
    entity
        .to_value(View::Public)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub(crate) fn public_list(entities: &[Entity]) -> ApiResult<Json<Value>> {
    let values = entities.iter().map(public).collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(Value::Array(values)))
}

pub(crate) fn require(payload: &Map<String, Value>, field: &'static str) -> ApiResult<()> {
    if payload.contains_key(field) {
        Ok(())
    } else {
        Err(ApiError::Missing(field))
    }
}

pub(crate) fn created(entity: &Entity) -> ApiResult<(StatusCode, Json<Value>)> {
    Ok((StatusCode::CREATED, Json(public(entity)?)))
}

/// `user_id` from a payload, which must name an existing user
pub(crate) async fn existing_user(
    state: &AppState,
    payload: &Map<String, Value>,
) -> ApiResult<()> {
    require(payload, "user_id")?;
    let user_id = payload
        .get("user_id")
        .and_then(Value::as_str)
        .ok_or(ApiError::NotFound)?;
    if state.catalog.exists(EntityKind::User, user_id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}

pub(crate) async fn list_kind(state: &AppState, kind: EntityKind) -> ApiResult<Json<Value>> {
    let entities = state.catalog.list(kind).await?;
    public_list(&entities)
}

pub(crate) async fn get_kind(state: &AppState, kind: EntityKind, id: &str) -> ApiResult<Json<Value>> {
    let entity = state.catalog.fetch(kind, id).await?;
    Ok(Json(public(&entity)?))
}

pub(crate) async fn create_kind(
    state: &AppState,
    kind: EntityKind,
    payload: &Map<String, Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let entity = state.catalog.create(kind, payload).await?;
    created(&entity)
}

pub(crate) async fn update_kind(
    state: &AppState,
    kind: EntityKind,
    id: &str,
    body: &Bytes,
) -> ApiResult<Json<Value>> {
    // Unknown ids are 404 before the body is looked at
    state.catalog.fetch(kind, id).await?;
    let patch = parse_object(body, false)?;
    let entity = state.catalog.update(kind, id, &patch).await?;
    Ok(Json(public(&entity)?))
}

pub(crate) async fn delete_kind(state: &AppState, kind: EntityKind, id: &str) -> ApiResult<Json<Value>> {
    state.catalog.remove(kind, id).await?;
    Ok(Json(json!({})))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::services::Catalog;
    use crate::storage::FileStorage;
    use crate::{app, AppState};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    pub fn test_state(dir: &tempfile::TempDir) -> AppState {
        let storage = FileStorage::new(dir.path().join("file.json"));
        AppState {
            catalog: Arc::new(Catalog::new(Arc::new(storage))),
            gate: Arc::new(RwLock::new(())),
        }
    }

    /// Router over a scratch JSON store
    pub fn test_app(dir: &tempfile::TempDir) -> Router {
        app(test_state(dir))
    }

    pub async fn send_raw(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        send_raw(app, method, uri, &body).await
    }

    /// POST and return the new record's id
    pub async fn create(app: &Router, uri: &str, body: Value) -> String {
        let (status, value) = send(app, "POST", uri, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", value);
        value["id"].as_str().unwrap().to_string()
    }
}
