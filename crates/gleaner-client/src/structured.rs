//! Bounded structured payload: meta tags, links, images and tables.

use std::collections::BTreeMap;

use gleaner_core::models::{PageImage, PageLink, StructuredPayload, Table};
use gleaner_core::util::truncate_chars;
use url::Url;

use crate::document::{Document, collapse_whitespace, select_within, visible_text};

pub const MAX_LINKS: usize = 50;
pub const MAX_IMAGES: usize = 20;
pub const MAX_TABLES: usize = 5;
pub const MAX_TABLE_ROWS: usize = 10;
/// Applies to link text and image alt text.
pub const MAX_LABEL_CHARS: usize = 100;

pub fn extract_structured(doc: &Document, base_url: &str) -> StructuredPayload {
    let base = Url::parse(base_url).ok();
    StructuredPayload {
        meta: extract_meta(doc),
        links: extract_links(doc, base.as_ref()),
        images: extract_images(doc, base.as_ref()),
        tables: extract_tables(doc),
    }
}

/// Resolve `reference` against `base`. Without a usable base only absolute
/// references resolve.
pub fn resolve(base: Option<&Url>, reference: &str) -> Option<String> {
    let resolved = match base {
        Some(base) => base.join(reference),
        None => Url::parse(reference),
    };
    resolved.ok().map(String::from)
}

fn extract_meta(doc: &Document) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();
    for el in doc.find_all("meta") {
        let attrs = el.value();
        let key = attrs
            .attr("name")
            .filter(|name| !name.is_empty())
            .or_else(|| attrs.attr("property"));
        if let (Some(key), Some(content)) = (key, attrs.attr("content"))
            && !key.is_empty()
            && !content.is_empty()
        {
            meta.insert(key.to_string(), content.to_string());
        }
    }
    meta
}

fn extract_links(doc: &Document, base: Option<&Url>) -> Vec<PageLink> {
    doc.select("a[href]")
        .into_iter()
        .filter_map(|el| {
            let href = el.value().attr("href")?.trim();
            let text = collapse_whitespace(&visible_text(el));
            if href.is_empty() || text.is_empty() {
                return None;
            }
            Some(PageLink {
                url: resolve(base, href)?,
                text: truncate_chars(&text, MAX_LABEL_CHARS),
            })
        })
        .take(MAX_LINKS)
        .collect()
}

fn extract_images(doc: &Document, base: Option<&Url>) -> Vec<PageImage> {
    doc.find_all("img")
        .into_iter()
        .filter_map(|el| {
            let src = el.value().attr("src")?.trim();
            if src.is_empty() {
                return None;
            }
            let alt = el.value().attr("alt").unwrap_or_default();
            Some(PageImage {
                url: resolve(base, src)?,
                alt: truncate_chars(alt, MAX_LABEL_CHARS),
            })
        })
        .take(MAX_IMAGES)
        .collect()
}

fn extract_tables(doc: &Document) -> Vec<Table> {
    doc.find_all("table")
        .into_iter()
        .take(MAX_TABLES)
        .filter_map(|table| {
            let rows: Table = select_within(table, "tr")
                .into_iter()
                .take(MAX_TABLE_ROWS)
                .map(|row| {
                    select_within(row, "th, td")
                        .into_iter()
                        .map(|cell| collapse_whitespace(&visible_text(cell)))
                        .collect::<Vec<_>>()
                })
                .filter(|cells| !cells.is_empty())
                .collect();
            (!rows.is_empty()).then_some(rows)
        })
        .collect()
}
