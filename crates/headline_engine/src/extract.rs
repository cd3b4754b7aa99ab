use headline_core::Entry;
use scraper::{Html, Selector};

/// Tag class scanned for headings when none is configured.
pub const DEFAULT_HEADING_SELECTOR: &str = "h3";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid heading selector {selector:?}: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

pub trait Extractor: Send + Sync {
    /// Returns the normalized entries in document order. Blank headings are dropped.
    fn extract(&self, html: &str) -> Vec<Entry>;
}

/// Collects the text of every element matching one selector.
#[derive(Debug, Clone)]
pub struct HeadingExtractor {
    selector: Selector,
}

impl HeadingExtractor {
    pub fn new(selector: &str) -> Result<Self, SelectorError> {
        let parsed = Selector::parse(selector).map_err(|err| SelectorError {
            selector: selector.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self { selector: parsed })
    }
}

impl Extractor for HeadingExtractor {
    fn extract(&self, html: &str) -> Vec<Entry> {
        let doc = Html::parse_document(html);
        doc.select(&self.selector)
            .filter_map(|node| Entry::normalize(&node.text().collect::<String>()))
            .collect()
    }
}
