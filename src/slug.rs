use std::sync::LazyLock;

use regex::{Captures, Regex};

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ _]").unwrap());
static UNSAFE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9-]").unwrap());
static UNICODE_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").unwrap());

/// Lowercase, turn each space or underscore into a hyphen, drop everything outside `[a-z0-9-]`.
pub fn sanitize_title(title: &str) -> String {
    let hyphenated = SEPARATOR_RE.replace_all(title, "-").to_lowercase();
    UNSAFE_RE.replace_all(&hyphenated, "").into_owned()
}

/// `<provider>-<sanitized title>`, e.g. `("AWS", "ec2_instance")` → `aws-ec2-instance`.
pub fn generate_slug(provider: &str, title: &str) -> String {
    format!("{}-{}", provider.to_lowercase(), sanitize_title(title))
}

/// Identifier used when the icon search service has no match.
pub fn fallback_iconify_id(provider: &str, title: &str) -> String {
    format!("logos:{}-{}", provider.to_lowercase(), sanitize_title(title))
}

pub fn clean_display_name(title: &str) -> String {
    title
        .trim()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Lists are stored as JSON-encoded strings in the output records.
pub fn array_to_json(items: &[String]) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Decode literal `\uXXXX` sequences, as found in inline `onclick` handlers.
pub fn unescape_unicode(escaped: &str) -> String {
    UNICODE_ESCAPE_RE
        .replace_all(escaped, |caps: &Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
