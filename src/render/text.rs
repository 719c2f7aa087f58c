//! Plain text rendering for extracted documents.

use crate::error::Result;
use crate::model::{Document, ElementContent};

use super::RenderOptions;

/// Convert a document to plain text.
///
/// Text elements of the selected pages, in reading order, separated by a
/// blank line. Running headers and footers are included only when enabled.
pub fn to_text(doc: &Document, options: &RenderOptions) -> Result<String> {
    let paragraphs: Vec<&str> = doc
        .pages
        .iter()
        .filter(|page| options.page_selection.includes(page.number))
        .flat_map(|page| page.elements.iter())
        .filter_map(|element| match &element.content {
            ElementContent::Text(c) => Some(c.text.trim()),
            ElementContent::Header(c) | ElementContent::Footer(c)
                if options.include_headers_footers =>
            {
                Some(c.text.trim())
            }
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect();

    Ok(paragraphs.join("\n\n"))
}
