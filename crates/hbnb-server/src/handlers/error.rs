//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hbnb_core::HbnbError;
use serde_json::json;
use tracing::error;

/// Every failure a handler can answer with. The body is always
/// `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    NotAJson,
    Missing(&'static str),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::NotAJson | ApiError::Missing(_) | ApiError::Invalid(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::NotFound => "Not found".to_string(),
            ApiError::NotAJson => "Not a JSON".to_string(),
            ApiError::Missing(field) => format!("Missing {}", field),
            ApiError::Invalid(message) => message.clone(),
            // Details stay in the log
            ApiError::Internal(_) => "Internal Server Error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!("Request failed: {}", detail);
        }
        let body = Json(json!({ "error": self.message() }));
        (self.status(), body).into_response()
    }
}

impl From<HbnbError> for ApiError {
    fn from(e: HbnbError) -> Self {
        match e {
            HbnbError::NotFound(_) => ApiError::NotFound,
            HbnbError::Validation(message) => ApiError::Invalid(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
