//! Client error types.

use thiserror::Error;

use ziva_core::ClientIdError;

/// Errors that can occur when talking to the storefront API or managing
/// local client state.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The base URL couldn't be joined with an endpoint path.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Reading or writing the state file failed.
    #[error("State file error: {0}")]
    Io(#[from] std::io::Error),

    /// The state file isn't valid JSON.
    #[error("Invalid state file: {0}")]
    State(#[from] serde_json::Error),

    /// The stored client ID is malformed.
    #[error("Invalid client ID: {0}")]
    ClientId(#[from] ClientIdError),

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,
}

impl ClientError {
    /// HTTP status of an API error, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
