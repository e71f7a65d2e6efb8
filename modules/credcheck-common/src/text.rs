//! Display-text decoding for backend strings.
//!
//! The analysis backend scrapes article pages and passes text through with
//! HTML entities and JSON-style escapes still in place. Everything shown to a
//! user goes through [`decode_display_text`] first.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Keywords beyond this count are not rendered.
pub const MAX_DISPLAY_KEYWORDS: usize = 12;

const ENTITIES: &[(&str, &str)] = &[
    ("&#8211;", "\u{2013}"),
    ("&#8212;", "\u{2014}"),
    ("&#8216;", "'"),
    ("&#8217;", "'"),
    ("&#8220;", "\""),
    ("&#8221;", "\""),
    ("&#39;", "'"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    // Must stay last so "&amp;lt;" decodes to "&lt;", not "<".
    ("&amp;", "&"),
];

static RE_SURROGATE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\u([dD][89abAB][0-9a-fA-F]{2})\\u([dD][c-fC-F][0-9a-fA-F]{2})").unwrap()
});
static RE_UNICODE_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").unwrap());

/// Decode HTML entities, `\uXXXX` escapes and backslash escapes.
///
/// Text without entities or backslashes comes back unchanged, so decoding an
/// already-decoded string is a no-op.
pub fn decode_display_text(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let mut decoded = input.to_string();
    for (entity, replacement) in ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }

    if decoded.contains("\\u") {
        decoded = RE_SURROGATE_PAIR
            .replace_all(&decoded, |caps: &Captures| {
                let high = u32::from_str_radix(&caps[1], 16).unwrap_or(0);
                let low = u32::from_str_radix(&caps[2], 16).unwrap_or(0);
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                char::from_u32(code)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
        decoded = RE_UNICODE_ESCAPE
            .replace_all(&decoded, |caps: &Captures| {
                u32::from_str_radix(&caps[1], 16)
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
    }

    if decoded.contains('\\') {
        decoded = unescape_backslashes(&decoded);
    }
    decoded
}

/// One left-to-right pass, so `\\n` is a backslash followed by `n`.
/// Unknown escapes are kept as written.
fn unescape_backslashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Decode keywords from the shape the backend transports them in.
///
/// The backend usually sends a JSON array encoded as a string. A literal JSON
/// array is accepted too. A string that fails to parse as JSON falls back to
/// stripping `[`, `]` and `"` and splitting on commas.
pub fn parse_keywords(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(raw) => parse_keyword_string(raw),
        serde_json::Value::Array(items) => items.iter().map(keyword_from_value).collect(),
        _ => Vec::new(),
    }
}

fn parse_keyword_string(raw: &str) -> Vec<String> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => items.iter().map(keyword_from_value).collect(),
        Ok(serde_json::Value::String(single)) => vec![single],
        _ => {
            tracing::debug!(raw, "Keywords are not a JSON array, splitting on commas");
            raw.replace(['[', ']', '"'], "")
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        }
    }
}

fn keyword_from_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decode each keyword for display and drop empty or placeholder entries.
pub fn process_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| decode_display_text(k.trim()))
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && k != "null" && k != "undefined")
        .collect()
}
