//! URL slugs for catalog navigation.

/// Lowercase a display name and collapse whitespace runs into single hyphens.
///
/// ```
/// use ziva_core::slugify;
///
/// assert_eq!(slugify("Garden Tools"), "garden-tools");
/// assert_eq!(slugify("  Lawn   Care "), "lawn-care");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_keeps_existing_hyphens() {
        assert_eq!(slugify("Drip-Irrigation Kits"), "drip-irrigation-kits");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify("   "), "");
    }
}
