use std::sync::LazyLock;

use regex::Regex;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9-]").expect("static slug pattern"));

/// Turn an item's display name into the path fragment appended to a feed's
/// urls: spaces become hyphens, anything outside `[a-zA-Z0-9-]` is dropped,
/// then the result is lower-cased.
pub fn slug(name: &str) -> String {
    let hyphenated = name.replace(' ', "-");
    NON_SLUG_CHARS
        .replace_all(&hyphenated, "")
        .to_ascii_lowercase()
}
