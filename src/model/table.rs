//! Table types.

use serde::{Deserialize, Serialize};

/// Table payload.
///
/// The service sends the same table three ways. They are kept exactly as
/// received and are never checked against each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableContent {
    /// HTML rendering
    pub html: String,

    /// CSV rendering
    pub csv: String,

    /// Structured cell list
    pub cells: Vec<TableCell>,
}

impl TableContent {
    /// Create a table payload carrying only a CSV rendering.
    pub fn from_csv(csv: impl Into<String>) -> Self {
        Self {
            csv: csv.into(),
            ..Self::default()
        }
    }

    /// Number of rows covered by the cell list (spans included).
    pub fn row_count(&self) -> u32 {
        self.cells
            .iter()
            .map(|c| c.row.saturating_add(c.row_span.max(1)))
            .max()
            .unwrap_or(0)
    }

    /// Number of columns covered by the cell list (spans included).
    pub fn column_count(&self) -> u32 {
        self.cells
            .iter()
            .map(|c| c.col.saturating_add(c.col_span.max(1)))
            .max()
            .unwrap_or(0)
    }

    /// Check if any cell spans several rows or columns.
    pub fn has_merged_cells(&self) -> bool {
        self.cells.iter().any(TableCell::is_merged)
    }

    /// Find the cell anchored at a row/column address.
    pub fn cell(&self, row: u32, col: u32) -> Option<&TableCell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }
}

/// A table cell from the structured cell list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    /// Zero-based row address
    pub row: u32,

    /// Zero-based column address
    pub col: u32,

    /// Number of rows this cell spans
    pub row_span: u32,

    /// Number of columns this cell spans
    pub col_span: u32,

    /// Cell content
    pub paragraphs: Vec<CellParagraph>,
}

impl TableCell {
    /// Create a single-span cell with one run of text.
    pub fn text(row: u32, col: u32, text: impl Into<String>) -> Self {
        Self {
            row,
            col,
            row_span: 1,
            col_span: 1,
            paragraphs: vec![CellParagraph {
                runs: vec![TextRun { text: text.into() }],
            }],
        }
    }

    /// Get plain text content, paragraphs separated by newlines.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(CellParagraph::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check if this cell spans multiple rows or columns.
    pub fn is_merged(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }
}

/// A paragraph inside a table cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellParagraph {
    /// Text runs
    pub runs: Vec<TextRun>,
}

impl CellParagraph {
    /// Concatenate the runs.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A run of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    /// Run text
    pub text: String,
}
