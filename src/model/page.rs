//! Page-level types.

use super::{Element, ElementKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single page in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in page units
    pub width: f64,

    /// Page height in page units
    pub height: f64,

    /// Element counts per type tag, as reported by the service
    pub extraction_summary: BTreeMap<String, u64>,

    /// Elements on the page, in reading order
    pub elements: Vec<Element>,
}

impl Page {
    /// Create a new page with the given dimensions.
    pub fn new(number: u32, width: f64, height: f64) -> Self {
        Self {
            number,
            width,
            height,
            extraction_summary: BTreeMap::new(),
            elements: Vec::new(),
        }
    }

    /// Add an element to the page, stamping it with this page's number.
    pub fn add_element(&mut self, mut element: Element) {
        element.page_number = self.number;
        self.elements.push(element);
    }

    /// Iterate over elements of one kind.
    pub fn elements_of(&self, kind: ElementKind) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.kind() == kind)
    }

    /// Check if the page has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get page dimensions as (width, height) tuple.
    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Check if the page is in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}
