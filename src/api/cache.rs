//! Cache revalidation hook for backend-side changes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use super::ApiResult;
use crate::auth::{verify_psk, API_KEY_HEADER};
use crate::errors::AppError;
use crate::models::{Envelope, ResourceKind};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RevalidateRequest {
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevalidateResponse {
    pub tags: Vec<String>,
    pub invalidated: usize,
}

/// POST /internal/revalidate - Drop cached reads under the given tags.
pub async fn revalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RevalidateRequest>, JsonRejection>,
) -> ApiResult<RevalidateResponse> {
    let Some(expected) = state.config.revalidate_key.as_deref() else {
        return Err(AppError::NotFound("Revalidation is disabled".to_string()));
    };
    let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    if !verify_psk(Some(expected), provided) {
        return Err(AppError::Unauthorized("Missing or invalid API key".to_string()));
    }
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let unknown: Vec<&str> = request
        .tags
        .iter()
        .map(String::as_str)
        .filter(|tag| ResourceKind::from_route(tag).is_none())
        .collect();
    if !unknown.is_empty() {
        return Err(AppError::BadRequest(format!("Unknown cache tags: {}", unknown.join(", "))));
    }

    let invalidated = state.gateway.cache().invalidate(&request.tags).await;
    tracing::info!("Revalidated tags {:?}: {} entries dropped", request.tags, invalidated);

    Ok(Envelope::ok(
        RevalidateResponse {
            tags: request.tags,
            invalidated,
        },
        200,
    ))
}
