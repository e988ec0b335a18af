//! Language code normalization
//!
//! Product metadata is localized per language; clients send anything from
//! "fr" to "fr-FR" to "FR_ca". Lookups only ever key on the primary subtag.

/// Default language used when the client sends nothing usable.
pub const DEFAULT_LANG: &str = "en";

/// Normalize a client-supplied language code to its lowercase primary subtag.
///
/// `Some("fr-FR")` and `Some("FR_ca")` both normalize to `"fr"`. `None`,
/// empty, or whitespace-only input falls back to [`DEFAULT_LANG`].
pub fn normalize_lang(lang: Option<&str>) -> String {
    let raw = match lang {
        Some(l) => l.trim(),
        None => return DEFAULT_LANG.to_string(),
    };

    if raw.is_empty() {
        return DEFAULT_LANG.to_string();
    }

    let primary = raw
        .split(|c| c == '-' || c == '_')
        .next()
        .unwrap_or(DEFAULT_LANG);

    primary.to_lowercase()
}
