//! Normalization helpers shared by the catalog and the loader.
//!
//! Song identities are compared after normalization, so every lookup path
//! (catalog insertion, title search, recommendation queries) must go through
//! `normalize_key`.

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Number written with comma thousands separators: "1,234", "12,345.5".
pub static THOUSANDS_GROUPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d{1,3}(?:,\d{3})+(?:\.\d+)?$").unwrap());

/// Regex to collapse runs of whitespace into a single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Normalize a title, artist or genre for identity comparison.
/// "  Hey  Jude " → "hey jude"
pub fn normalize_key(s: &str) -> String {
    MULTI_SPACE.replace_all(s.trim(), " ").to_lowercase()
}

/// Strip thousands separators from a numeric field before parsing.
/// Only well-formed groupings are rewritten; anything else ("1,2") is
/// returned trimmed so the parse fails loudly.
pub fn strip_thousands_separators(s: &str) -> String {
    let s = s.trim();
    if THOUSANDS_GROUPED.is_match(s) {
        s.replace(',', "")
    } else {
        s.to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================
