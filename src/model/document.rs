//! Document-level types.

use super::{Element, ElementContent, Page};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An extracted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document name as reported by the service
    pub name: String,

    /// Total page count as reported by the service (advisory)
    pub total_pages: u32,

    /// Pages in the document, in service order
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a new empty document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total_pages: 0,
            pages: Vec::new(),
        }
    }

    /// Get the number of pages actually present.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by its page number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&Page> {
        self.pages.iter().find(|page| page.number == page_num)
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
        self.total_pages = self.total_pages.max(self.pages.len() as u32);
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Iterate over all elements in reading order (page, then element).
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.pages.iter().flat_map(|page| page.elements.iter())
    }

    /// Get the total number of elements.
    pub fn element_count(&self) -> usize {
        self.pages.iter().map(|page| page.elements.len()).sum()
    }

    /// Count elements by type tag across all pages.
    ///
    /// Counts come from the elements actually present, not from the
    /// per-page summaries reported by the service.
    pub fn summary(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for element in self.elements() {
            *counts.entry(element.type_tag().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Archive member names referenced by image elements.
    pub fn image_sources(&self) -> Vec<&str> {
        self.elements()
            .filter_map(|element| match &element.content {
                ElementContent::Image(image) if !image.src.is_empty() => Some(image.src.as_str()),
                _ => None,
            })
            .collect()
    }
}
