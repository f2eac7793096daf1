//! One unit of work per request
//!
//! Mutating requests hold the gate exclusively and end with
//! `Storage::close`, so a failed write never leaks staged changes into the
//! next request. Reads share the gate, so they only ever see saved state,
//! and never close.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use tracing::warn;

pub async fn unit_of_work(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        let _gate = state.gate.read().await;
        return next.run(request).await;
    }

    let _gate = state.gate.write().await;
    let response = next.run(request).await;
    if let Err(e) = state.catalog.storage().close().await {
        warn!("Failed to close unit of work: {}", e);
    }
    response
}
