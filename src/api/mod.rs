//! REST API module.
//!
//! Every handler answers with an [`Envelope`]; the HTTP status always equals
//! `envelope.status`.

mod cache;
mod configurations;
mod entities;
mod ui;
mod warehouses;

pub use cache::*;
pub use configurations::*;
pub use entities::*;
pub use ui::*;
pub use warehouses::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::Session;
use crate::errors::AppError;
use crate::gateway::GatewayResult;
use crate::models::{Envelope, ResourceKind};
use crate::permissions::{denied_message, Action};

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Handler result: an envelope, or an error rendered as one.
pub type ApiResult<T> = Result<Envelope<T>, AppError>;

/// Turn an expired session into a 401 and pass every other envelope through.
pub fn respond<T>(result: GatewayResult<T>) -> ApiResult<T> {
    result.map_err(AppError::from)
}

/// Reject callers lacking the code for `action` on `kind`.
pub fn require(session: &Session, kind: ResourceKind, action: Action) -> Result<(), AppError> {
    if session.permissions.allows(kind, action) {
        Ok(())
    } else {
        Err(AppError::Forbidden(denied_message(kind, action)))
    }
}
