//! JSON object request bodies
//!
//! Top-level creates take a [`JsonObject`]. Routes that name a record in the
//! path (nested creates, updates) take raw `Bytes` and call [`parse_object`]
//! after looking that record up, so an unknown id is a 404 even when the body
//! is garbage. Search also parses by hand because it accepts `{}`.

use crate::handlers::error::ApiError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::{Map, Value};

/// A request body that must be a non-empty JSON object
#[derive(Debug, Clone)]
pub struct JsonObject(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::NotAJson)?;
        parse_object(&body, false).map(JsonObject)
    }
}

/// Parse a body as a JSON object. Anything else (including `{}` unless
/// `allow_empty`) is `Not a JSON`.
pub fn parse_object(body: &[u8], allow_empty: bool) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if allow_empty || !map.is_empty() => Ok(map),
        _ => Err(ApiError::NotAJson),
    }
}
