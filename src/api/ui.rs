//! Endpoints backing the console's dialogs and list toolbars.

use axum::{
    extract::{rejection::JsonRejection, Path, RawQuery, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::{require, respond, ApiResult};
use crate::auth::Session;
use crate::errors::AppError;
use crate::forms::richtext::insert_link;
use crate::forms::{DraftForm, FormDraft};
use crate::listing::{row_actions, toolbar_actions, ModalMarker, RowAction, ToolbarAction, ViewState};
use crate::modal::ModalSession;
use crate::models::{
    AdminEntity, Envelope, Permission, ResourceKind, Role, SystemConfiguration, Warehouse,
};
use crate::permissions::Action;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormMode {
    Create,
    Edit,
    View,
}

/// A dialog ready to render.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub resource: ResourceKind,
    pub mode: FormMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub submit_disabled: bool,
    pub form: FormDraft,
}

#[derive(Debug, Serialize)]
pub struct RowActions {
    pub id: String,
    pub actions: Vec<RowAction>,
}

#[derive(Debug, Serialize)]
pub struct ActionsView {
    pub toolbar: Vec<ToolbarAction>,
    pub rows: Vec<RowActions>,
}

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    #[serde(default)]
    pub text: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResult {
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

/// GET /api/ui/{res}/form - Form for `create=true`, `edit=<id>` or `view=<id>`.
pub async fn form_definition(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(res): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiResult<FormView> {
    let query = query.unwrap_or_default();
    match resource(&res)? {
        ResourceKind::Permission => form_for::<Permission>(&state, &session, &query).await,
        ResourceKind::Role => form_for::<Role>(&state, &session, &query).await,
        ResourceKind::Warehouse => form_for::<Warehouse>(&state, &session, &query).await,
        ResourceKind::Configuration => {
            form_for::<SystemConfiguration>(&state, &session, &query).await
        }
    }
}

/// GET /api/ui/{res}/actions - Toolbar and per-row actions for the caller.
pub async fn list_actions(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(res): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiResult<ActionsView> {
    let query = query.unwrap_or_default();
    match resource(&res)? {
        ResourceKind::Permission => actions_for::<Permission>(&state, &session, &query).await,
        ResourceKind::Role => actions_for::<Role>(&state, &session, &query).await,
        ResourceKind::Warehouse => actions_for::<Warehouse>(&state, &session, &query).await,
        ResourceKind::Configuration => {
            actions_for::<SystemConfiguration>(&state, &session, &query).await
        }
    }
}

/// POST /api/ui/sanitize-link - Build a rich-text anchor, or refuse the URL.
pub async fn sanitize_link(
    Extension(_session): Extension<Session>,
    body: Result<Json<LinkRequest>, JsonRejection>,
) -> ApiResult<LinkResult> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    match insert_link(&request.text, &request.url) {
        Ok(link) => Ok(Envelope::ok(
            LinkResult {
                href: link.href,
                html: Some(link.html),
                alert: None,
            },
            200,
        )),
        Err(rejected) => {
            let mut envelope = Envelope::failure(400, rejected.alert.clone());
            envelope.data = Some(LinkResult {
                href: rejected.href,
                html: None,
                alert: Some(rejected.alert),
            });
            Ok(envelope)
        }
    }
}

fn resource(route: &str) -> Result<ResourceKind, AppError> {
    ResourceKind::from_route(route)
        .ok_or_else(|| AppError::NotFound(format!("Unknown resource {}", route)))
}

async fn form_for<E: AdminEntity>(
    state: &AppState,
    session: &Session,
    query: &str,
) -> ApiResult<FormView> {
    require(session, E::KIND, Action::View)?;

    let view = ViewState::decode(E::KIND, query);
    let mut modal = ModalSession::<E>::new();
    let (mode, id) = match &view.modal {
        ModalMarker::None => {
            return Err(AppError::BadRequest(
                "Specify create=true, edit=<id> or view=<id>".to_string(),
            ))
        }
        ModalMarker::Create => (FormMode::Create, None),
        ModalMarker::Edit(id) => (FormMode::Edit, Some(id.clone())),
        ModalMarker::View(id) => (FormMode::View, Some(id.clone())),
    };

    match &id {
        Some(id) => {
            let envelope = respond(state.gateway.get::<E>(session.token(), id).await)?;
            let entity = match envelope.data {
                Some(entity) => entity,
                None => return Ok(envelope.cast()),
            };
            modal.open_edit(&entity);
        }
        None => modal.open_create(),
    }

    let mut form = modal.form().clone();
    for (field, lookup) in <E::Draft as DraftForm>::lookups() {
        if !session.permissions.allows(*lookup, Action::View) {
            continue;
        }
        let options = respond(
            state
                .gateway
                .lookup_options(session.token(), *lookup, state.config.snapshot_page_size)
                .await,
        )?;
        match options.data {
            Some(options) => form.set_options(field, options),
            None => tracing::warn!(
                "Lookup of {} for {} failed: {}",
                lookup,
                field,
                options.message.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    let title = match mode {
        FormMode::Create => format!("Create {}", E::KIND.label().to_lowercase()),
        FormMode::Edit => format!("Edit {}", E::KIND.label().to_lowercase()),
        FormMode::View => format!("{} details", E::KIND.label()),
    };
    let submit_disabled = mode == FormMode::View || modal.is_submit_disabled(&session.permissions);
    if mode == FormMode::View {
        form = form.read_only();
    }

    Ok(Envelope::ok(
        FormView {
            resource: E::KIND,
            mode,
            id,
            title,
            submit_disabled,
            form,
        },
        200,
    ))
}

async fn actions_for<E: AdminEntity>(
    state: &AppState,
    session: &Session,
    query: &str,
) -> ApiResult<ActionsView> {
    require(session, E::KIND, Action::View)?;

    let view = ViewState::decode(E::KIND, query);
    let envelope = respond(state.gateway.list::<E>(session.token(), &view).await)?;
    let page = match envelope.data {
        Some(page) => page,
        None => return Ok(envelope.cast()),
    };

    let rows = page
        .data
        .iter()
        .map(|row| RowActions {
            id: row.id().to_string(),
            actions: row_actions(&session.permissions, row),
        })
        .collect();

    Ok(Envelope::ok(
        ActionsView {
            toolbar: toolbar_actions(E::KIND, &session.permissions),
            rows,
        },
        200,
    ))
}
