//! Session and pre-shared key authentication.
//!
//! The console's SSO proxy forwards the user's bearer token and granted
//! permission codes; the session layer turns them into a [`Session`].
//! Internal endpoints use a pre-shared key compared in constant time.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::permissions::PermissionSet;

/// Header name for the pre-shared key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the caller's granted permission codes.
pub const PERMISSIONS_HEADER: &str = "x-user-permissions";

/// The authenticated caller, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct Session {
    /// Forwarded to the backend as the bearer token.
    pub access_token: String,
    pub permissions: PermissionSet,
}

impl Session {
    pub fn new(access_token: impl Into<String>, permissions: PermissionSet) -> Self {
        Self {
            access_token: access_token.into(),
            permissions,
        }
    }

    pub fn token(&self) -> &str {
        &self.access_token
    }
}

/// Require a bearer token and attach the [`Session`] to the request.
pub async fn session_layer(mut request: Request, next: Next) -> Response {
    match session_from_headers(request.headers()) {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => AppError::Unauthorized("Missing or invalid bearer token".to_string()).into_response(),
    }
}

fn session_from_headers(headers: &HeaderMap) -> Option<Session> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())?;

    let permissions = headers
        .get(PERMISSIONS_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(PermissionSet::parse)
        .unwrap_or_default();

    Some(Session::new(token, permissions))
}

/// Check a provided key against the configured one. No configured key
/// rejects everything.
pub fn verify_psk(expected: Option<&str>, provided: Option<&str>) -> bool {
    match (expected, provided) {
        (Some(expected), Some(provided)) if !expected.is_empty() => {
            constant_time_compare(provided, expected)
        }
        _ => false,
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    a_bytes.ct_eq(b_bytes).into()
}
