//! Vault key naming convention
//!
//! Several applications share one Credential Manager. Every key is prefixed
//! with the owning application's short name and a `:` so each one can
//! enumerate its own entries with a `short:*` filter.
//!
//! Web entries are stored with their scheme (`app:https://host/`); lookups
//! compare names with the scheme and trailing slash removed.

/// Builds the physical vault key for a server
///
/// # Examples
/// - `("app", "svc")` -> `"app:svc"`
pub fn to_physical_key(short_name: &str, server_name: &str) -> String {
    format!("{}:{}", short_name, server_name)
}

/// Enumeration filter matching every key owned by `short_name`
pub fn enumeration_filter(short_name: &str) -> String {
    format!("{}:*", short_name)
}

/// Strips the `short:http[s]://` prefix and one trailing `/` from a name
///
/// Names that don't start with `short:http` (in any case) are returned as-is.
///
/// # Examples
/// - `"app:https://host.com/"` -> `"host.com"`
/// - `"app:http://host.com"` -> `"host.com"`
/// - `"other:thing"` -> `"other:thing"`
pub fn normalize_logical_name(app_name: &str, short_name: &str) -> String {
    if app_name.is_empty() {
        return String::new();
    }

    let http = format!("{}:http", short_name);
    let Some(rest) = strip_prefix_ignore_case(app_name, &http) else {
        return app_name.to_string();
    };

    let rest = rest.strip_suffix('/').unwrap_or(rest);
    let rest = match rest.chars().next() {
        Some('s') | Some('S') => &rest[1..],
        _ => rest,
    };
    rest.strip_prefix("://").unwrap_or(rest).to_string()
}

/// Compares two application names after normalization, ignoring case
pub fn names_match(stored: &str, requested: &str, short_name: &str) -> bool {
    normalize_logical_name(stored, short_name).to_lowercase()
        == normalize_logical_name(requested, short_name).to_lowercase()
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let mut value_chars = value.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = value_chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    let offset = value_chars.next().map_or(value.len(), |(index, _)| index);
    Some(&value[offset..])
}
