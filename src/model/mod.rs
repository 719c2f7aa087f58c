//! Document model types for DataInsight extraction results.
//!
//! This module defines the typed representation the loosely typed service
//! payload is normalized into. A [`Document`] owns its pages, pages own their
//! elements, and nothing points back up the tree.

mod chart;
mod document;
mod element;
mod page;
mod table;

pub use chart::ChartContent;
pub use document::Document;
pub use element::{BoundingBox, Element, ElementContent, ElementKind, ImageContent, TextContent};
pub use page::Page;
pub use table::{CellParagraph, TableCell, TableContent, TextRun};
