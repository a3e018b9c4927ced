//! Tolerant HTML document tree.
//!
//! [`Document::parse`] never fails: invalid UTF-8 is replaced and malformed
//! markup is repaired by the HTML5 parser, so callers always get a tree to
//! query, possibly an empty one.

use scraper::{ElementRef, Html, Selector};

/// Elements whose text never counts as visible content.
const INVISIBLE_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// A parsed page.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(bytes: &[u8]) -> Self {
        Self::parse_str(&String::from_utf8_lossy(bytes))
    }

    pub fn parse_str(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// The `<html>` element.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// First element with the given tag name.
    pub fn find_first(&self, tag: &str) -> Option<ElementRef<'_>> {
        self.select_first(tag)
    }

    /// Every element with the given tag name, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<ElementRef<'_>> {
        self.select(tag)
    }

    /// Elements matching a CSS selector. An invalid selector matches nothing.
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(css).ok()?;
        self.html.select(&selector).next()
    }
}

/// Matches within `element`'s subtree. An invalid selector matches nothing.
pub fn select_within<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => element.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Nearest enclosing element, if any.
pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Visible text of `element`: each descendant text run trimmed, empty runs
/// dropped, the rest joined with a single space. Script, style and noscript
/// subtrees are skipped.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut runs = Vec::new();
    collect_text(element, &mut runs);
    runs.join(" ")
}

fn collect_text(element: ElementRef<'_>, runs: &mut Vec<String>) {
    if INVISIBLE_TAGS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let run = text.trim();
            if !run.is_empty() {
                runs.push(run.to_string());
            }
        } else if let Some(child) = ElementRef::wrap(child) {
            collect_text(child, runs);
        }
    }
}

/// Collapse every whitespace run (newlines and tabs included) to one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
