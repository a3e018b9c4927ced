use gleaner_core::models::{LinkCandidate, PageContent};
use gleaner_core::traits::Extractor;
use url::Url;

use crate::content::{extract_body, extract_title};
use crate::document::{Document, collapse_whitespace, parent_element, visible_text};
use crate::structured::{extract_structured, resolve};

/// [`Extractor`] backed by the tolerant `scraper` document tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, body: &[u8], base_url: &str) -> PageContent {
        let doc = Document::parse(body);
        PageContent {
            title: extract_title(&doc),
            body: extract_body(&doc),
            payload: extract_structured(&doc, base_url),
        }
    }

    fn links(&self, body: &[u8], page_url: &str) -> Vec<LinkCandidate> {
        let doc = Document::parse(body);
        let base = Url::parse(page_url).ok();

        doc.select("a[href]")
            .into_iter()
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?.trim();
                if href.is_empty() {
                    return None;
                }
                let url = resolve(base.as_ref(), href)?;
                let context_text = parent_element(anchor)
                    .map(|parent| collapse_whitespace(&visible_text(parent)))
                    .unwrap_or_default();
                Some(LinkCandidate {
                    url,
                    title: collapse_whitespace(&visible_text(anchor)),
                    anchor_html: anchor.html(),
                    context_text,
                })
            })
            .collect()
    }
}
