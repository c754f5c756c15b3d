//! JSON API handlers.
//!
//! Every handler returns `Result<_, AppError>`, so malformed bodies, bad
//! query strings and bad path segments all come back as `{"error": ...}`.

pub mod admin;
pub mod cart;
pub mod categories;
pub mod order;
pub mod products;
pub mod wishlist;

use axum::{
    extract::{FromRequest, FromRequestParts},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use ziva_core::ClientId;

use crate::error::AppError;

/// JSON body extractor and response whose rejections are [`AppError`]s.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor whose rejections are [`AppError`]s.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor whose rejections are [`AppError`]s.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `?clientId=` query parameter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientQuery {
    pub client_id: Option<String>,
}

/// Response body for remove/clear operations.
#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub message: &'static str,
    pub removed: u64,
}

/// Message-only response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Non-blank text, trimmed.
fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Resolve the client for a read: the explicit parameter wins, the cookie
/// is the fallback.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if neither yields a valid client ID.
pub(crate) fn resolve_client_id(
    explicit: Option<&str>,
    cookie: Option<ClientId>,
) -> Result<ClientId, AppError> {
    match present(explicit) {
        Some(raw) => Ok(ClientId::parse(raw)?),
        None => cookie.ok_or_else(|| AppError::BadRequest("clientId is required".to_string())),
    }
}

/// Parse a client ID that the caller must name explicitly.
///
/// # Errors
///
/// Returns `AppError::BadRequest` with `missing` if it's absent, or the
/// validation message if it's malformed.
pub(crate) fn require_client_id(raw: Option<&str>, missing: &str) -> Result<ClientId, AppError> {
    let raw = present(raw).ok_or_else(|| AppError::BadRequest(missing.to_string()))?;
    Ok(ClientId::parse(raw)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_client_id_wins() {
        let cookie = ClientId::parse("cookie-id").ok();
        let id = resolve_client_id(Some("query-id"), cookie).unwrap();
        assert_eq!(id.as_str(), "query-id");
    }

    #[test]
    fn test_cookie_fallback() {
        let cookie = ClientId::parse("cookie-id").ok();
        assert_eq!(
            resolve_client_id(Some("   "), cookie).unwrap().as_str(),
            "cookie-id"
        );
        assert!(matches!(
            resolve_client_id(None, None),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_require_client_id_message() {
        let err = require_client_id(None, "clientId and productId are required").unwrap_err();
        assert_eq!(err.to_string(), "clientId and productId are required");
    }
}
