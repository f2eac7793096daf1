//! Links between places and amenities

use super::{public, public_list, ApiResult};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

pub async fn list(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let amenities = state.catalog.amenities_of(&place_id).await?;
    public_list(&amenities)
}

/// 201 when the link is new, 200 when it already existed
pub async fn link(
    State(state): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let (amenity, linked) = state.catalog.link_amenity(&place_id, &amenity_id).await?;
    let status = if linked {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(public(&amenity)?)))
}

pub async fn unlink(
    State(state): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    state.catalog.unlink_amenity(&place_id, &amenity_id).await?;
    Ok(Json(json!({})))
}
