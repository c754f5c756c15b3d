//! Anonymous client identifier.
//!
//! Carts, wishlists and orders are scoped to an opaque token generated once
//! per browser (or other client) rather than to an account. The token travels
//! explicitly with every request.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur when parsing a [`ClientId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientIdError {
    /// The input is empty or whitespace.
    #[error("clientId cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("clientId must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[A-Za-z0-9_-]`.
    #[error("clientId contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Opaque identifier for an anonymous storefront client.
///
/// Accepts any token of ASCII alphanumerics, `-` and `_` up to
/// [`ClientId::MAX_LENGTH`] characters so that identifiers minted by older
/// clients keep working. New identifiers are UUIDv4.
///
/// ```
/// use ziva_core::ClientId;
///
/// let id = ClientId::generate();
/// assert_eq!(id.as_str().len(), 36);
///
/// assert!(ClientId::parse("  ").is_err());
/// assert!(ClientId::parse("abc;drop").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    /// Maximum accepted length.
    pub const MAX_LENGTH: usize = 128;

    /// Generate a fresh collision-resistant identifier (UUIDv4).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse a client identifier, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, or contains
    /// characters other than ASCII alphanumerics, `-` and `_`.
    pub fn parse(s: &str) -> Result<Self, ClientIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ClientIdError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ClientIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(ClientIdError::InvalidCharacter(c));
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ClientId {
    type Err = ClientIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClientId {
    type Error = ClientIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ClientId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ClientId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ClientId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_uuid() {
        let id = ClientId::generate();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
        assert_ne!(id, ClientId::generate());
    }

    #[test]
    fn test_parse_trims() {
        let id = ClientId::parse("  client-1  ").unwrap();
        assert_eq!(id.as_str(), "client-1");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(ClientId::parse(""), Err(ClientIdError::Empty));
        assert_eq!(ClientId::parse("   "), Err(ClientIdError::Empty));
    }

    #[test]
    fn test_parse_rejects_long() {
        let long = "a".repeat(ClientId::MAX_LENGTH + 1);
        assert!(matches!(
            ClientId::parse(&long),
            Err(ClientIdError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_cookie_metacharacters() {
        assert_eq!(
            ClientId::parse("abc;path=/"),
            Err(ClientIdError::InvalidCharacter(';'))
        );
    }

    #[test]
    fn test_serde_validates() {
        let id: ClientId = serde_json::from_str("\"abc_123\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc_123\"");
        assert!(serde_json::from_str::<ClientId>("\"\"").is_err());
    }
}
