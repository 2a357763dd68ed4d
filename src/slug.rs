//! Slug generation for entities that need one

use regex::Regex;
use std::sync::LazyLock;

/// Longest slug NetBox accepts
pub const MAX_SLUG_LEN: usize = 100;

static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_]+").expect("slug pattern is valid"));

/// Derive a slug from a display name
///
/// Lowercases, collapses every run of other characters into `-`, trims
/// dashes and truncates to [`MAX_SLUG_LEN`].
///
/// ```
/// use netbox_provider::slug::slugify;
///
/// assert_eq!(slugify("MX204 Router (rev 2)"), "mx204-router-rev-2");
/// ```
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let dashed = NON_SLUG.replace_all(&lowered, "-");
    let trimmed: String = dashed.trim_matches('-').chars().take(MAX_SLUG_LEN).collect();
    trimmed.trim_end_matches('-').to_string()
}

/// Whether a slug has an acceptable length
pub fn valid_length(slug: &str) -> bool {
    (1..=MAX_SLUG_LEN).contains(&slug.chars().count())
}
