use regex::Regex;
use std::sync::LazyLock;

static AUTHOR_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:;|,\s*and\s+|,|\s+and\s+|\s*&\s*)\s*")
        .expect("author separator pattern is valid")
});

/// Splits a free-form author string into individual names, in order.
///
/// Accepts `;`, `,`, `and`, `&` and the Oxford-comma form `, and`.
/// Empty and whitespace-only input yields an empty list.
pub fn parse_authors(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    AUTHOR_SEPARATOR
        .split(raw)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Legacy single-string form stored in `books.author`.
pub fn join_authors(names: &[String]) -> Option<String> {
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}
