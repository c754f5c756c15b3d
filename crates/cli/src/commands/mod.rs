//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// `STOREFRONT_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first if present.
pub fn database_url() -> Option<SecretString> {
    let _ = dotenvy::dotenv();
    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
