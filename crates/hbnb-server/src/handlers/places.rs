//! Place handlers and place search

use super::{
    create_kind, delete_kind, existing_user, get_kind, public_list, require, update_kind,
    ApiResult,
};
use crate::extractors::parse_object;
use crate::handlers::error::ApiError;
use crate::services::PlaceSearch;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::EntityKind;
use serde_json::Value;

/// Places listed in one city
pub async fn list_of_city(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let places = state
        .catalog
        .children(EntityKind::City, &city_id, EntityKind::Place)
        .await?;
    public_list(&places)
}

pub async fn create_in_city(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    state.catalog.fetch(EntityKind::City, &city_id).await?;
    let mut payload = parse_object(&body, false)?;
    existing_user(&state, &payload).await?;
    require(&payload, "name")?;

    payload.insert("city_id".to_string(), Value::String(city_id));
    create_kind(&state, EntityKind::Place, &payload).await
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    get_kind(&state, EntityKind::Place, &id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    update_kind(&state, EntityKind::Place, &id, &body).await
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    delete_kind(&state, EntityKind::Place, &id).await
}

/// `POST /places_search`; `{}` is a valid (match-all) query
pub async fn search(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let filters = parse_object(&body, true)?;
    let query: PlaceSearch = serde_json::from_value(Value::Object(filters))
        .map_err(|e| ApiError::Invalid(e.to_string()))?;

    let places = state.catalog.search_places(&query).await?;
    public_list(&places)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{create, send, send_raw, test_app};
    use axum::http::StatusCode;
    use axum::Router;
    use serde_json::json;

    struct Fixture {
        city: String,
        user: String,
    }

    async fn fixture(app: &Router) -> Fixture {
        let state = create(app, "/api/v1/states", json!({"name": "CA"})).await;
        let city = create(app, &format!("/api/v1/states/{}/cities", state), json!({"name": "SF"})).await;
        let user = create(app, "/api/v1/users", json!({"email": "a@b.c", "password": "p"})).await;
        Fixture { city, user }
    }

    #[tokio::test]
    async fn test_create_place_in_city() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let f = fixture(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/cities/{}/places", f.city),
            Some(json!({"user_id": f.user, "name": "Loft", "number_rooms": 3, "latitude": 37.77})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["city_id"], f.city.as_str());
        assert_eq!(body["number_rooms"], 3);
        assert_eq!(body["max_guest"], 0);
        assert_eq!(body["amenity_ids"], json!([]));

        let (_, places) = send(&app, "GET", &format!("/api/v1/cities/{}/places", f.city), None).await;
        assert_eq!(places, json!([body]));
    }

    #[tokio::test]
    async fn test_create_check_order() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let f = fixture(&app).await;
        let uri = format!("/api/v1/cities/{}/places", f.city);

        let (status, _) = send(&app, "POST", "/api/v1/cities/nope/places", Some(json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send_raw(&app, "POST", &uri, "[]").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Not a JSON"}));

        let (status, body) = send(&app, "POST", &uri, Some(json!({"name": "Loft"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Missing user_id"}));

        let (status, _) = send(&app, "POST", &uri, Some(json!({"user_id": "ghost", "name": "Loft"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, "POST", &uri, Some(json!({"user_id": f.user}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Missing name"}));
    }

    #[tokio::test]
    async fn test_update_keeps_owner_and_city() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let f = fixture(&app).await;
        let id = create(
            &app,
            &format!("/api/v1/cities/{}/places", f.city),
            json!({"user_id": f.user, "name": "Loft"}),
        )
        .await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/v1/places/{}", id),
            Some(json!({"user_id": "x", "city_id": "y", "price_by_night": 120})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], f.user.as_str());
        assert_eq!(body["city_id"], f.city.as_str());
        assert_eq!(body["price_by_night"], 120);

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/v1/places/{}", id),
            Some(json!({"max_guest": "many"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let f = fixture(&app).await;
        create(
            &app,
            &format!("/api/v1/cities/{}/places", f.city),
            json!({"user_id": f.user, "name": "Loft"}),
        )
        .await;

        let (status, body) = send_raw(&app, "POST", "/api/v1/places_search", "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/places_search",
            Some(json!({"cities": ["elsewhere"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = send_raw(&app, "POST", "/api/v1/places_search", "nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Not a JSON"}));

        let (status, _) = send(&app, "POST", "/api/v1/places_search", Some(json!({"states": "CA"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
