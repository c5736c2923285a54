//! System configuration endpoints beyond CRUD.

use axum::{
    extract::{Path, State},
    Extension,
};

use super::{respond, ApiResult};
use crate::auth::Session;
use crate::models::SystemConfiguration;
use crate::AppState;

/// POST /api/system-configurations/{id}/set-current - Make a configuration current.
pub async fn set_current(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<SystemConfiguration> {
    respond(state.mutations.set_current(&session, &id).await)
}
