use std::collections::BTreeSet;

/// Normalize raw tag input into a set of lowercase tags
///
/// Entries may be single tags or free text; free text is split on `,` and `;`.
/// Blank fragments are dropped.
pub fn normalize_tags<S: AsRef<str>>(raw: &[S]) -> BTreeSet<String> {
    raw.iter()
        .flat_map(|entry| entry.as_ref().split([',', ';']))
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Overlap of two tag sets: |A ∩ B| / |A ∪ B|
///
/// `both_empty` is returned when neither side has any tags.
/// One empty side yields 0.0.
#[inline]
pub fn tag_overlap(a: &BTreeSet<String>, b: &BTreeSet<String>, both_empty: f64) -> f64 {
    if a.is_empty() && b.is_empty() {
        return both_empty;
    }

    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;

    shared as f64 / union as f64
}

/// Tags present on both sides, in sorted order
pub fn shared_tags(a: &BTreeSet<String>, b: &BTreeSet<String>) -> Vec<String> {
    a.intersection(b).cloned().collect()
}

/// Case- and whitespace-insensitive comparison of free-text attributes
#[inline]
pub fn same_text(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    !a.is_empty() && a.to_lowercase() == b.to_lowercase()
}
