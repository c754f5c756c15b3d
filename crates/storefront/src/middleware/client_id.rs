//! Anonymous client identity cookie.
//!
//! Every API request carries a client identifier. Mutations name it in the
//! body; reads may rely on the `clientId` cookie instead. On first contact
//! the middleware mints a UUID v4 and sets the cookie for a year.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    middleware::Next,
    response::Response,
};

use ziva_core::ClientId;

use crate::state::AppState;

/// Name of the client identity cookie.
pub const CLIENT_ID_COOKIE: &str = "clientId";

/// Cookie lifetime: one year.
const COOKIE_MAX_AGE_SECS: u32 = 31_536_000;

/// Client ID resolved from the cookie (or minted) by [`client_id_middleware`].
#[derive(Debug, Clone)]
struct ResolvedClientId(ClientId);

/// Extractor for the cookie-derived client ID.
///
/// Holds `None` only when the middleware didn't run for this route.
#[derive(Debug, Clone)]
pub struct CookieClientId(pub Option<ClientId>);

impl<S> FromRequestParts<S> for CookieClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<ResolvedClientId>()
                .map(|resolved| resolved.0.clone()),
        ))
    }
}

/// Find a valid `clientId` among the request's cookies.
#[must_use]
pub fn client_id_from_cookies(headers: &HeaderMap) -> Option<ClientId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CLIENT_ID_COOKIE)
        .and_then(|(_, value)| ClientId::parse(value).ok())
}

/// `Set-Cookie` value for a client ID.
#[must_use]
pub fn client_id_cookie(client_id: &ClientId, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{CLIENT_ID_COOKIE}={client_id}; Path=/; Max-Age={COOKIE_MAX_AGE_SECS}; SameSite=Lax{secure}")
}

/// Resolve the client ID cookie, minting one on first contact.
pub async fn client_id_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = client_id_from_cookies(request.headers());
    let minted = existing.is_none();
    let client_id = existing.unwrap_or_else(ClientId::generate);

    request
        .extensions_mut()
        .insert(ResolvedClientId(client_id.clone()));

    let mut response = next.run(request).await;

    if minted {
        let cookie = client_id_cookie(&client_id, state.config().secure_cookies());
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
            tracing::debug!(client_id = %client_id, "Issued client ID cookie");
        }
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_reads_client_id_among_cookies() {
        let id = client_id_from_cookies(&headers("theme=dark; clientId=abc-123; other=1"));
        assert_eq!(id.unwrap().as_str(), "abc-123");
    }

    #[test]
    fn test_ignores_invalid_cookie_value() {
        assert!(client_id_from_cookies(&headers("clientId=")).is_none());
        assert!(client_id_from_cookies(&headers("clientId=a%20b")).is_none());
        assert!(client_id_from_cookies(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        let id = ClientId::parse("abc").unwrap();
        assert_eq!(
            client_id_cookie(&id, false),
            "clientId=abc; Path=/; Max-Age=31536000; SameSite=Lax"
        );
        assert!(client_id_cookie(&id, true).ends_with("; Secure"));
    }
}
