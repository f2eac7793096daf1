//! State handlers

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
    list_kind(&state, EntityKind::State).await
}

pub async fn create(
    State(state): State<AppState>,
    JsonObject(payload): JsonObject,
) -> ApiResult<(StatusCode, Json<Value>)> {
    require(&payload, "name")?;
    create_kind(&state, EntityKind::State, &payload).await
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    get_kind(&state, EntityKind::State, &id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    update_kind(&state, EntityKind::State, &id, &body).await
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    delete_kind(&state, EntityKind::State, &id).await
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{create, send, send_raw, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/states",
            Some(json!({"name": "California", "id": "mine"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["__class__"], "State");
        assert_eq!(body["name"], "California");
        assert_ne!(body["id"], "mine");

        let id = body["id"].as_str().unwrap();
        let (status, fetched) = send(&app, "GET", &format!("/api/v1/states/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, body);

        let (status, listed) = send(&app, "GET", "/api/v1/states", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([body]));
    }

    #[tokio::test]
    async fn test_create_errors() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let (status, body) = send_raw(&app, "POST", "/api/v1/states", "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Not a JSON"}));

        let (status, body) = send_raw(&app, "POST", "/api/v1/states", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Not a JSON"}));

        let (status, body) = send(&app, "POST", "/api/v1/states", Some(json!({"nom": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Missing name"}));

        let (status, _) = send(&app, "POST", "/api/v1/states", Some(json!({"name": 7}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_ignores_frozen_fields() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let id = create(&app, "/api/v1/states", json!({"name": "CA"})).await;
        let uri = format!("/api/v1/states/{}", id);
        let (_, before) = send(&app, "GET", &uri, None).await;

        let (status, body) = send(
            &app,
            "PUT",
            &uri,
            Some(json!({"name": "California", "id": "other", "created_at": "2000-01-01T00:00:00.000000"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "California");
        assert_eq!(body["id"], id.as_str());
        assert_eq!(body["created_at"], before["created_at"]);

        let (status, body) = send_raw(&app, "PUT", &uri, "nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Not a JSON"}));
    }

    #[tokio::test]
    async fn test_unknown_id_is_404_before_body_checks() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        for method in ["GET", "DELETE"] {
            let (status, body) = send(&app, method, "/api/v1/states/nope", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({"error": "Not found"}));
        }
        let (status, _) = send_raw(&app, "PUT", "/api/v1/states/nope", "garbage").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_returns_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let id = create(&app, "/api/v1/states", json!({"name": "CA"})).await;
        let uri = format!("/api/v1/states/{}", id);

        let (status, body) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));

        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
