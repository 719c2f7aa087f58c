//! Element types: the common base shape and per-type content payloads.

use super::{ChartContent, TableContent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A positioned content element on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Identifier assigned by the service (unique within a document)
    pub id: String,

    /// Number of the page the element belongs to
    pub page_number: u32,

    /// Bounding box in page units
    pub bbox: BoundingBox,

    /// Type-specific payload
    pub content: ElementContent,
}

impl Element {
    /// Create an element with an empty bounding box and no page assigned.
    pub fn new(id: impl Into<String>, content: ElementContent) -> Self {
        Self {
            id: id.into(),
            page_number: 0,
            bbox: BoundingBox::default(),
            content,
        }
    }

    /// Set the bounding box and return self.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = bbox;
        self
    }

    /// Get the element kind.
    pub fn kind(&self) -> ElementKind {
        self.content.kind()
    }

    /// Get the type tag as it appears in the service payload.
    ///
    /// Unknown elements report the tag they were received with.
    pub fn type_tag(&self) -> &str {
        match &self.content {
            ElementContent::Other { type_tag, .. } => type_tag,
            content => content.kind().as_str(),
        }
    }

    /// Get the element's text field, if its type carries one.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            ElementContent::Text(c)
            | ElementContent::Shape(c)
            | ElementContent::Equation(c)
            | ElementContent::Header(c)
            | ElementContent::Footer(c) => Some(&c.text),
            ElementContent::Image(image) => Some(&image.text),
            ElementContent::Table(_) | ElementContent::Chart(_) => None,
            ElementContent::Other { raw, .. } => raw.get("text").and_then(Value::as_str),
        }
    }

    /// Get the element's CSV field, if its type carries one.
    pub fn csv(&self) -> Option<&str> {
        match &self.content {
            ElementContent::Table(table) => Some(&table.csv),
            ElementContent::Chart(chart) => Some(&chart.csv),
            ElementContent::Other { raw, .. } => raw.get("csv").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Element bounding box.
///
/// Edges are stored as received; `left <= right` and `top <= bottom` are not
/// guaranteed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub left: f64,
    /// Top edge
    pub top: f64,
    /// Right edge
    pub right: f64,
    /// Bottom edge
    pub bottom: f64,
}

impl BoundingBox {
    /// Create a bounding box from its four edges.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Absolute horizontal extent.
    pub fn width(&self) -> f64 {
        (self.right - self.left).abs()
    }

    /// Absolute vertical extent.
    pub fn height(&self) -> f64 {
        (self.bottom - self.top).abs()
    }
}

/// Type-specific element payload, one variant per type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementContent {
    /// Body text
    Text(TextContent),

    /// A picture stored in the response archive
    Image(ImageContent),

    /// A table in three independent representations
    Table(TableContent),

    /// A recognized chart
    Chart(ChartContent),

    /// A drawing shape, possibly with text
    Shape(TextContent),

    /// A formula, usually as LaTeX
    Equation(TextContent),

    /// Running page header
    Header(TextContent),

    /// Running page footer
    Footer(TextContent),

    /// An element type this client does not know, kept as received
    Other {
        /// Type tag from the payload
        type_tag: String,
        /// Raw content object
        raw: Value,
    },
}

impl ElementContent {
    /// Get the kind of this payload.
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementContent::Text(_) => ElementKind::Text,
            ElementContent::Image(_) => ElementKind::Image,
            ElementContent::Table(_) => ElementKind::Table,
            ElementContent::Chart(_) => ElementKind::Chart,
            ElementContent::Shape(_) => ElementKind::Shape,
            ElementContent::Equation(_) => ElementKind::Equation,
            ElementContent::Header(_) => ElementKind::Header,
            ElementContent::Footer(_) => ElementKind::Footer,
            ElementContent::Other { .. } => ElementKind::Other,
        }
    }
}

/// Element discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// `text`
    Text,
    /// `image`
    Image,
    /// `table`
    Table,
    /// `chart`
    Chart,
    /// `shape`
    Shape,
    /// `equation`
    Equation,
    /// `header`
    Header,
    /// `footer`
    Footer,
    /// Any other tag
    Other,
}

impl ElementKind {
    /// Map a payload type tag to a kind. Matching ignores ASCII case.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "text" => ElementKind::Text,
            "image" => ElementKind::Image,
            "table" => ElementKind::Table,
            "chart" => ElementKind::Chart,
            "shape" => ElementKind::Shape,
            "equation" => ElementKind::Equation,
            "header" => ElementKind::Header,
            "footer" => ElementKind::Footer,
            _ => ElementKind::Other,
        }
    }

    /// Canonical type tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Image => "image",
            ElementKind::Table => "table",
            ElementKind::Chart => "chart",
            ElementKind::Shape => "shape",
            ElementKind::Equation => "equation",
            ElementKind::Header => "header",
            ElementKind::Footer => "footer",
            ElementKind::Other => "other",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain text payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    /// The text
    pub text: String,
}

impl TextContent {
    /// Create a text payload.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Image payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Caption or recognized text
    pub text: String,

    /// Archive member holding the image bytes
    pub src: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_from_tag() {
        assert_eq!(ElementKind::from_tag("text"), ElementKind::Text);
        assert_eq!(ElementKind::from_tag("TABLE"), ElementKind::Table);
        assert_eq!(ElementKind::from_tag(" footer "), ElementKind::Footer);
        assert_eq!(ElementKind::from_tag("sticker"), ElementKind::Other);
        assert_eq!(ElementKind::Equation.to_string(), "equation");
    }

    #[test]
    fn test_type_tag_of_unknown_element() {
        let element = Element::new(
            "x1",
            ElementContent::Other {
                type_tag: "caption".to_string(),
                raw: json!({"text": "Figure 1"}),
            },
        );
        assert_eq!(element.kind(), ElementKind::Other);
        assert_eq!(element.type_tag(), "caption");
        assert_eq!(element.text(), Some("Figure 1"));
        assert_eq!(element.csv(), None);
    }

    #[test]
    fn test_text_and_csv_fields() {
        let text = Element::new("t", ElementContent::Header(TextContent::new("Title")));
        assert_eq!(text.text(), Some("Title"));
        assert_eq!(text.csv(), None);

        let table = Element::new("tb", ElementContent::Table(TableContent::from_csv("a,b")));
        assert_eq!(table.text(), None);
        assert_eq!(table.csv(), Some("a,b"));
    }

    #[test]
    fn test_bbox_extent_tolerates_inverted_edges() {
        let bbox = BoundingBox::new(100.0, 50.0, 40.0, 10.0);
        assert_eq!(bbox.width(), 60.0);
        assert_eq!(bbox.height(), 40.0);
    }

    #[test]
    fn test_content_serializes_with_type_tag() {
        let content = ElementContent::Text(TextContent::new("hi"));
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value, json!({"type": "text", "text": "hi"}));
    }
}
