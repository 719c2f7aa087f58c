//! Derived views over a normalized document.
//!
//! Every function here walks pages in order, then elements in order, and
//! never touches the network or the archive. Calling one twice on the same
//! document yields the same result.

use crate::model::{ChartContent, Document, ElementContent, ElementKind};
use serde::{Deserialize, Serialize};

/// A retrieval-ready piece of text taken from one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Name of the source document
    pub document: String,

    /// Page the element sits on
    pub page_number: u32,

    /// Type tag of the source element
    pub element_type: String,

    /// Trimmed text payload, never empty
    pub text: String,
}

/// Collect the text of every `text` element in reading order.
///
/// Elements whose text is blank after trimming are skipped.
pub fn collect_text(doc: &Document) -> Vec<String> {
    doc.elements()
        .filter_map(|element| match &element.content {
            ElementContent::Text(content) if !content.text.trim().is_empty() => {
                Some(content.text.clone())
            }
            _ => None,
        })
        .collect()
}

/// Collect the CSV rendering of every `table` element in reading order.
///
/// Tables without a CSV rendering are skipped.
pub fn collect_tables(doc: &Document) -> Vec<String> {
    doc.elements()
        .filter_map(|element| match &element.content {
            ElementContent::Table(table) if !table.csv.trim().is_empty() => {
                Some(table.csv.clone())
            }
            _ => None,
        })
        .collect()
}

/// Collect every chart payload in reading order.
pub fn collect_charts(doc: &Document) -> Vec<&ChartContent> {
    doc.elements()
        .filter_map(|element| match &element.content {
            ElementContent::Chart(chart) => Some(chart),
            _ => None,
        })
        .collect()
}

/// Build one chunk per content-bearing element, across all element kinds.
///
/// The payload is the element's text field if it has non-blank text,
/// otherwise its CSV field. Elements with neither are skipped.
pub fn build_chunks(doc: &Document) -> Vec<Chunk> {
    doc.elements()
        .filter_map(|element| {
            let text = [element.text(), element.csv()]
                .into_iter()
                .flatten()
                .map(str::trim)
                .find(|candidate| !candidate.is_empty())?;

            Some(Chunk {
                document: doc.name.clone(),
                page_number: element.page_number,
                element_type: element.type_tag().to_string(),
                text: text.to_string(),
            })
        })
        .collect()
}

/// Count chunks per element kind, e.g. for progress output.
pub fn chunk_kinds(chunks: &[Chunk]) -> Vec<(ElementKind, usize)> {
    let mut counts: Vec<(ElementKind, usize)> = Vec::new();
    for chunk in chunks {
        let kind = ElementKind::from_tag(&chunk.element_type);
        match counts.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += 1,
            None => counts.push((kind, 1)),
        }
    }
    counts
}
