//! CRUD endpoints shared by every resource.

use axum::{
    extract::{rejection::JsonRejection, Path, RawQuery, State},
    Extension, Json,
};

use super::{require, respond, ApiResult};
use crate::auth::Session;
use crate::errors::AppError;
use crate::listing::ViewState;
use crate::models::{AdminEntity, Page};
use crate::mutation::Snapshot;
use crate::permissions::Action;
use crate::AppState;

/// GET /api/{res} - One page for the view-state query.
pub async fn list<E: AdminEntity>(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    RawQuery(query): RawQuery,
) -> ApiResult<Page<E>> {
    require(&session, E::KIND, Action::View)?;

    let view = ViewState::decode(E::KIND, query.as_deref().unwrap_or_default());
    respond(state.gateway.list::<E>(session.token(), &view).await)
}

/// GET /api/{res}/{id} - A single record.
pub async fn detail<E: AdminEntity>(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<E> {
    require(&session, E::KIND, Action::View)?;

    respond(state.gateway.get::<E>(session.token(), &id).await)
}

/// POST /api/{res} - Create from a draft.
pub async fn create<E: AdminEntity>(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Result<Json<E::Draft>, JsonRejection>,
) -> ApiResult<E> {
    let Json(draft) = body.map_err(bad_body)?;

    respond(
        state
            .mutations
            .create::<E>(&session, &draft, Snapshot::Fetch)
            .await,
    )
}

/// PUT /api/{res}/{id} - Update from a draft.
pub async fn update<E: AdminEntity>(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    body: Result<Json<E::Draft>, JsonRejection>,
) -> ApiResult<E> {
    let Json(draft) = body.map_err(bad_body)?;

    respond(
        state
            .mutations
            .update::<E>(&session, &id, &draft, Snapshot::Fetch)
            .await,
    )
}

/// DELETE /api/{res}/{id} - Delete a record.
pub async fn remove<E: AdminEntity>(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    respond(state.mutations.delete::<E>(&session, &id).await)
}

fn bad_body(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}
