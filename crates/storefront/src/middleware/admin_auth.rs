//! Bearer-token guard for the admin API.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::config::token_matches;
use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires `Authorization: Bearer <ADMIN_API_TOKEN>`.
///
/// When no token is configured every admin request is rejected.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_handler(_admin: RequireAdmin) -> impl IntoResponse {
///     "ok"
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config().admin_api_token.as_ref() else {
            return Err(AppError::Unauthorized("Admin API is disabled".to_string()));
        };

        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        match presented {
            Some(token) if token_matches(expected, token) => Ok(Self),
            _ => {
                tracing::warn!(path = %parts.uri.path(), "Rejected admin request");
                Err(AppError::Unauthorized(
                    "Invalid or missing admin token".to_string(),
                ))
            }
        }
    }
}
