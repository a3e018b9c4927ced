//! Title and main-body extraction.

use gleaner_core::util::truncate_chars;

use crate::document::{Document, collapse_whitespace, visible_text};

/// Upper bound on stored body text, in characters.
pub const MAX_BODY_CHARS: usize = 10_000;

/// Content-area selectors, highest precedence first.
const CONTENT_SELECTORS: [&str; 8] = [
    "main",
    "article",
    ".content",
    ".main-content",
    "#content",
    "#main",
    ".post-content",
    ".entry-content",
];

/// First non-empty `<title>`, else first non-empty `<h1>`. Only the ends are
/// trimmed.
pub fn extract_title(doc: &Document) -> Option<String> {
    first_non_empty(doc, "title").or_else(|| first_non_empty(doc, "h1"))
}

fn first_non_empty(doc: &Document, tag: &str) -> Option<String> {
    doc.find_all(tag)
        .into_iter()
        .map(|el| visible_text(el).trim().to_string())
        .find(|text| !text.is_empty())
}

/// Visible text of the primary content area, whitespace-collapsed and
/// silently truncated to [`MAX_BODY_CHARS`].
///
/// The first selector in the cascade that matches an element wins. When no
/// selector matches, or the winner has no visible text, the whole document
/// is used.
pub fn extract_body(doc: &Document) -> String {
    let area = CONTENT_SELECTORS
        .iter()
        .find_map(|css| doc.select_first(css))
        .map(visible_text)
        .filter(|text| !text.is_empty());

    let text = area.unwrap_or_else(|| visible_text(doc.root()));
    truncate_chars(&collapse_whitespace(&text), MAX_BODY_CHARS)
}
