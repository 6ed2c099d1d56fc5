use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Length of the human-friendly order identifier.
pub const SHORT_ID_LEN: usize = 8;

/// Generate a short uppercase alphanumeric order identifier.
pub fn generate_short_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SHORT_ID_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect()
}

/// Generate a new v4 uuid as a string key value.
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Lowercase, accent-free form of a name used for substring search.
pub fn normalize_text(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}
