//! Normalization of the decoded service payload into the document model.
//!
//! The payload is best-effort: fields go missing, numbers arrive as strings,
//! and new element types appear without notice. Normalization therefore only
//! fails when the page list itself is unusable. Everything else falls back to
//! an empty default and, where it hints at an upstream problem, a warning.

use crate::error::{Error, Result};
use crate::model::{
    BoundingBox, CellParagraph, ChartContent, Document, Element, ElementContent, ElementKind,
    ImageContent, Page, TableCell, TableContent, TextContent, TextRun,
};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

type Object = Map<String, Value>;

/// Normalize a decoded payload tree into a [`Document`].
///
/// # Errors
///
/// Returns [`Error::Schema`] if the root is not an object or its page list
/// is missing or not an array.
///
/// # Example
///
/// ```
/// use serde_json::json;
///
/// let tree = json!({
///     "docName": "memo.docx",
///     "pages": [{
///         "pageNum": 1,
///         "elements": [{"type": "text", "id": "t1", "content": {"text": "hello"}}]
///     }]
/// });
/// let doc = datainsight::normalize(&tree).unwrap();
/// assert_eq!(datainsight::collect_text(&doc), vec!["hello"]);
/// ```
pub fn normalize(tree: &Value) -> Result<Document> {
    let root = tree.as_object().ok_or_else(|| Error::Schema {
        path: "$".to_string(),
        reason: format!("expected an object, found {}", kind_of(tree)),
    })?;

    let page_values = match root.get("pages") {
        Some(Value::Array(pages)) => pages,
        Some(other) => {
            return Err(Error::Schema {
                path: "$.pages".to_string(),
                reason: format!("expected an array, found {}", kind_of(other)),
            })
        }
        None => {
            return Err(Error::Schema {
                path: "$.pages".to_string(),
                reason: "page list is missing".to_string(),
            })
        }
    };

    let name = string_field(root, &["docName", "documentName", "fileName"]);

    let mut pages = Vec::with_capacity(page_values.len());
    for (index, value) in page_values.iter().enumerate() {
        match value.as_object() {
            Some(page) => pages.push(normalize_page(page, index)),
            None => warn!(
                "$.pages[{}]: expected an object, found {}; page skipped",
                index,
                kind_of(value)
            ),
        }
    }

    let total_pages = u32_field(root, &["totalPages", "pageCount"]).unwrap_or(pages.len() as u32);
    if total_pages as usize != pages.len() {
        warn!(
            "document reports {} pages but the payload holds {}",
            total_pages,
            pages.len()
        );
    }

    check_page_order(&pages);
    check_unique_ids(&pages);

    let doc = Document {
        name,
        total_pages,
        pages,
    };
    debug!(
        "normalized '{}': {} pages, {} elements",
        doc.name,
        doc.page_count(),
        doc.element_count()
    );
    Ok(doc)
}

fn normalize_page(page: &Object, index: usize) -> Page {
    let number = u32_field(page, &["pageNum", "pageNumber"]).unwrap_or_else(|| {
        debug!("$.pages[{}]: no page number, using position", index);
        index as u32 + 1
    });

    let extraction_summary = match get(page, &["extractionSummary"]) {
        Some(Value::Object(summary)) => summary
            .iter()
            .filter_map(|(tag, count)| as_u64(count).map(|count| (tag.clone(), count)))
            .collect(),
        Some(other) => {
            warn!(
                "$.pages[{}].extractionSummary: expected an object, found {}",
                index,
                kind_of(other)
            );
            BTreeMap::new()
        }
        None => BTreeMap::new(),
    };

    let elements = match get(page, &["elements"]) {
        Some(Value::Array(elements)) => elements
            .iter()
            .enumerate()
            .filter_map(|(i, value)| match value.as_object() {
                Some(element) => Some(normalize_element(element, number)),
                None => {
                    warn!(
                        "$.pages[{}].elements[{}]: expected an object, found {}; element skipped",
                        index,
                        i,
                        kind_of(value)
                    );
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    Page {
        number,
        width: f64_field(page, &["pageWidth", "width"]),
        height: f64_field(page, &["pageHeight", "height"]),
        extraction_summary,
        elements,
    }
}

fn normalize_element(element: &Object, page_number: u32) -> Element {
    let type_tag = string_field(element, &["type"]);
    let raw = get(element, &["content"]);

    let content = match ElementKind::from_tag(&type_tag) {
        ElementKind::Text => ElementContent::Text(text_content(raw)),
        ElementKind::Image => ElementContent::Image(image_content(raw)),
        ElementKind::Table => ElementContent::Table(table_content(raw)),
        ElementKind::Chart => ElementContent::Chart(chart_content(raw)),
        ElementKind::Shape => ElementContent::Shape(text_content(raw)),
        ElementKind::Equation => ElementContent::Equation(text_content(raw)),
        ElementKind::Header => ElementContent::Header(text_content(raw)),
        ElementKind::Footer => ElementContent::Footer(text_content(raw)),
        ElementKind::Other => {
            debug!("unknown element type '{}' kept as passthrough", type_tag);
            ElementContent::Other {
                type_tag,
                raw: raw.cloned().unwrap_or(Value::Null),
            }
        }
    };

    Element {
        id: string_field(element, &["id"]),
        page_number,
        bbox: bounding_box(get(element, &["boundaryBox", "boundingBox", "bbox"])),
        content,
    }
}

fn text_content(raw: Option<&Value>) -> TextContent {
    match raw {
        Some(Value::String(text)) => TextContent::new(text.clone()),
        Some(Value::Object(content)) => TextContent::new(string_field(content, &["text"])),
        _ => TextContent::default(),
    }
}

fn image_content(raw: Option<&Value>) -> ImageContent {
    match raw {
        Some(Value::Object(content)) => ImageContent {
            text: string_field(content, &["text", "caption"]),
            src: string_field(content, &["src", "path"]),
        },
        _ => ImageContent::default(),
    }
}

fn table_content(raw: Option<&Value>) -> TableContent {
    let Some(Value::Object(content)) = raw else {
        return TableContent::default();
    };

    let cells = match get(content, &["json", "cells"]) {
        Some(Value::Array(cells)) => cells
            .iter()
            .filter_map(Value::as_object)
            .map(table_cell)
            .collect(),
        _ => Vec::new(),
    };

    TableContent {
        html: string_field(content, &["html"]),
        csv: string_field(content, &["csv"]),
        cells,
    }
}

fn table_cell(cell: &Object) -> TableCell {
    let paragraphs = match get(cell, &["paragraphs"]) {
        Some(Value::Array(paragraphs)) => paragraphs
            .iter()
            .filter_map(Value::as_object)
            .map(|paragraph| CellParagraph {
                runs: match get(paragraph, &["runs"]) {
                    Some(Value::Array(runs)) => runs
                        .iter()
                        .filter_map(Value::as_object)
                        .map(|run| TextRun {
                            text: string_field(run, &["text"]),
                        })
                        .collect(),
                    _ => Vec::new(),
                },
            })
            .collect(),
        _ => match get(cell, &["text"]) {
            Some(text) => vec![CellParagraph {
                runs: vec![TextRun {
                    text: scalar_string(text),
                }],
            }],
            None => Vec::new(),
        },
    };

    TableCell {
        row: u32_field(cell, &["row", "rowIndex"]).unwrap_or(0),
        col: u32_field(cell, &["col", "colIndex"]).unwrap_or(0),
        row_span: u32_field(cell, &["rowSpan"]).unwrap_or(1),
        col_span: u32_field(cell, &["colSpan"]).unwrap_or(1),
        paragraphs,
    }
}

fn chart_content(raw: Option<&Value>) -> ChartContent {
    let Some(Value::Object(content)) = raw else {
        return ChartContent::default();
    };

    let series_values = match get(content, &["seriesValues"]) {
        Some(Value::Array(rows)) if rows.iter().any(Value::is_array) => rows
            .iter()
            .map(|row| match row {
                Value::Array(values) => values.iter().map(as_f64).collect(),
                _ => Vec::new(),
            })
            .collect(),
        // A flat list is a single series.
        Some(Value::Array(values)) if !values.is_empty() => {
            vec![values.iter().map(as_f64).collect()]
        }
        _ => Vec::new(),
    };

    ChartContent {
        chart_type: string_field(content, &["chartType"]),
        title: string_field(content, &["title"]),
        axis_labels: string_list(get(content, &["axisLabels", "xAxisLabels"])),
        series_names: string_list(get(content, &["seriesNames"])),
        series_values,
        csv: string_field(content, &["csv"]),
    }
}

fn bounding_box(raw: Option<&Value>) -> BoundingBox {
    match raw {
        Some(Value::Object(bbox)) => BoundingBox::new(
            f64_field(bbox, &["left"]),
            f64_field(bbox, &["top"]),
            f64_field(bbox, &["right"]),
            f64_field(bbox, &["bottom"]),
        ),
        Some(Value::Array(edges)) if edges.len() == 4 => {
            let edge = |i: usize| as_f64(&edges[i]).unwrap_or(0.0);
            BoundingBox::new(edge(0), edge(1), edge(2), edge(3))
        }
        _ => BoundingBox::default(),
    }
}

fn check_page_order(pages: &[Page]) {
    for pair in pages.windows(2) {
        if pair[1].number <= pair[0].number {
            warn!(
                "page numbers not increasing: page {} follows page {}",
                pair[1].number, pair[0].number
            );
        }
    }
}

fn check_unique_ids(pages: &[Page]) {
    let mut seen = HashSet::new();
    for element in pages.iter().flat_map(|page| &page.elements) {
        if !element.id.is_empty() && !seen.insert(element.id.as_str()) {
            warn!("duplicate element id '{}'", element.id);
        }
    }
}

/// First present, non-null value among the candidate keys.
fn get<'a>(object: &'a Object, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn string_field(object: &Object, keys: &[&str]) -> String {
    get(object, keys).map(scalar_string).unwrap_or_default()
}

fn f64_field(object: &Object, keys: &[&str]) -> f64 {
    get(object, keys).and_then(as_f64).unwrap_or(0.0)
}

fn u32_field(object: &Object, keys: &[&str]) -> Option<u32> {
    get(object, keys)
        .and_then(as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

fn string_list(raw: Option<&Value>) -> Vec<String> {
    match raw {
        Some(Value::Array(items)) => items.iter().map(scalar_string).collect(),
        _ => Vec::new(),
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok().filter(|f: &f64| f.is_finite()),
        _ => None,
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> Value {
        json!({
            "docName": "sample.pdf",
            "totalPages": 1,
            "pages": [{
                "pageNum": 1,
                "pageWidth": 595.0,
                "pageHeight": 842.0,
                "extractionSummary": {"text": 1, "table": 1},
                "elements": [
                    {
                        "type": "text",
                        "id": "t1",
                        "boundaryBox": {"left": 10, "top": 20, "right": 300, "bottom": 40},
                        "content": {"text": "hello"}
                    },
                    {
                        "type": "table",
                        "id": "tb1",
                        "boundaryBox": [10, 50, 300, 200],
                        "content": {
                            "html": "<table><tr><td>a</td><td>b</td></tr></table>",
                            "csv": "a,b\n1,2",
                            "json": [
                                {"row": 0, "col": 0, "rowSpan": 1, "colSpan": 1,
                                 "paragraphs": [{"runs": [{"text": "a"}]}]},
                                {"row": 0, "col": 1, "text": "b"}
                            ]
                        }
                    }
                ]
            }]
        })
    }

    #[test]
    fn test_normalize_fixture() {
        let doc = normalize(&fixture()).unwrap();
        assert_eq!(doc.name, "sample.pdf");
        assert_eq!(doc.total_pages, 1);
        assert_eq!(doc.page_count(), 1);

        let page = &doc.pages[0];
        assert_eq!(page.number, 1);
        assert_eq!(page.dimensions(), (595.0, 842.0));
        assert_eq!(page.extraction_summary.get("table"), Some(&1));

        let text = &page.elements[0];
        assert_eq!(text.id, "t1");
        assert_eq!(text.page_number, 1);
        assert_eq!(text.bbox, BoundingBox::new(10.0, 20.0, 300.0, 40.0));
        assert_eq!(text.text(), Some("hello"));

        let table = &page.elements[1];
        assert_eq!(table.bbox, BoundingBox::new(10.0, 50.0, 300.0, 200.0));
        match &table.content {
            ElementContent::Table(t) => {
                assert_eq!(t.csv, "a,b\n1,2");
                assert!(t.html.starts_with("<table>"));
                assert_eq!(t.cells.len(), 2);
                assert_eq!(t.cells[1].plain_text(), "b");
                assert_eq!(t.cells[1].row_span, 1);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let tree = fixture();
        assert_eq!(normalize(&tree).unwrap(), normalize(&tree).unwrap());
    }

    #[test]
    fn test_missing_pages_is_schema_error() {
        let err = normalize(&json!({"docName": "x"})).unwrap_err();
        match err {
            Error::Schema { path, .. } => assert_eq!(path, "$.pages"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_pages_not_array_is_schema_error() {
        let err = normalize(&json!({"pages": {"1": {}}})).unwrap_err();
        assert!(matches!(err, Error::Schema { ref path, .. } if path == "$.pages"));
    }

    #[test]
    fn test_root_not_object_is_schema_error() {
        let err = normalize(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, Error::Schema { ref path, .. } if path == "$"));
    }

    #[test]
    fn test_missing_summary_defaults_to_empty() {
        let doc = normalize(&json!({"pages": [{"pageNum": 1, "elements": []}]})).unwrap();
        assert!(doc.pages[0].extraction_summary.is_empty());
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let doc = normalize(&json!({"pages": [{}, {"elements": [{"type": "text"}]}]})).unwrap();
        assert_eq!(doc.name, "");
        assert_eq!(doc.total_pages, 2);
        assert_eq!(doc.pages[0].number, 1);
        assert_eq!(doc.pages[1].number, 2);
        assert_eq!(doc.pages[0].width, 0.0);

        let element = &doc.pages[1].elements[0];
        assert_eq!(element.id, "");
        assert_eq!(element.bbox, BoundingBox::default());
        assert_eq!(element.text(), Some(""));
    }

    #[test]
    fn test_unknown_type_is_passthrough() {
        let tree = json!({"pages": [{"elements": [
            {"type": "caption", "id": "c1", "content": {"text": "Figure 1", "extra": [1, 2]}}
        ]}]});
        let doc = normalize(&tree).unwrap();
        let element = &doc.pages[0].elements[0];
        assert_eq!(element.kind(), ElementKind::Other);
        assert_eq!(element.type_tag(), "caption");
        match &element.content {
            ElementContent::Other { raw, .. } => assert_eq!(raw["extra"], json!([1, 2])),
            other => panic!("expected passthrough, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let tree = json!({"totalPages": "3", "pages": [{"pageNum": "7", "pageWidth": "100.5"}]});
        let doc = normalize(&tree).unwrap();
        assert_eq!(doc.total_pages, 3);
        assert_eq!(doc.pages[0].number, 7);
        assert_eq!(doc.pages[0].width, 100.5);
    }

    #[test]
    fn test_non_object_entries_skipped() {
        let tree = json!({"pages": [
            "garbage",
            {"pageNum": 2, "elements": [42, {"type": "text", "content": "inline"}]}
        ]});
        let doc = normalize(&tree).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages[0].elements.len(), 1);
        assert_eq!(doc.pages[0].elements[0].text(), Some("inline"));
    }

    #[test]
    fn test_out_of_order_pages_kept() {
        let tree = json!({"pages": [{"pageNum": 2}, {"pageNum": 1}, {"pageNum": 1}]});
        let doc = normalize(&tree).unwrap();
        let numbers: Vec<_> = doc.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![2, 1, 1]);
    }

    #[test]
    fn test_chart_content() {
        let tree = json!({"pages": [{"elements": [{
            "type": "chart",
            "id": "ch1",
            "content": {
                "chartType": "bar",
                "title": "Sales",
                "axisLabels": ["Q1", "Q2"],
                "seriesNames": ["2023", "2024"],
                "seriesValues": [[1, 2], [3, null]],
                "csv": ",Q1,Q2\n2023,1,2\n2024,3,"
            }
        }]}]});
        let doc = normalize(&tree).unwrap();
        match &doc.pages[0].elements[0].content {
            ElementContent::Chart(chart) => {
                assert_eq!(chart.chart_type, "bar");
                assert_eq!(chart.axis_labels, vec!["Q1", "Q2"]);
                assert_eq!(chart.series_names, vec!["2023", "2024"]);
                assert_eq!(
                    chart.series_values,
                    vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0), None]]
                );
            }
            other => panic!("expected chart, got {other:?}"),
        }
    }

    #[test]
    fn test_flat_series_is_single_series() {
        let tree = json!({"pages": [{"elements": [{
            "type": "chart",
            "content": {"seriesValues": [5, "6.5"]}
        }]}]});
        let doc = normalize(&tree).unwrap();
        match &doc.pages[0].elements[0].content {
            ElementContent::Chart(chart) => {
                assert_eq!(chart.series_values, vec![vec![Some(5.0), Some(6.5)]]);
            }
            other => panic!("expected chart, got {other:?}"),
        }
    }

    #[test]
    fn test_image_content() {
        let tree = json!({"pages": [{"elements": [{
            "type": "image",
            "id": "img1",
            "content": {"src": "images/img1.png", "caption": "Logo"}
        }]}]});
        let doc = normalize(&tree).unwrap();
        assert_eq!(doc.image_sources(), vec!["images/img1.png"]);
        assert_eq!(doc.pages[0].elements[0].text(), Some("Logo"));
    }

    #[test]
    fn test_non_finite_numeric_strings_fall_back() {
        let tree = json!({"pages": [{
            "pageNum": 1,
            "pageWidth": "NaN",
            "pageHeight": "inf",
            "elements": [
                {"type": "text", "boundaryBox": ["NaN", 1, "-infinity", 2]},
                {"type": "chart", "content": {"seriesValues": ["nan", 3]}}
            ]
        }]});

        let first = normalize(&tree).unwrap();
        assert_eq!(first, normalize(&tree).unwrap());

        let page = &first.pages[0];
        assert_eq!(page.dimensions(), (0.0, 0.0));
        assert_eq!(page.elements[0].bbox, BoundingBox::new(0.0, 1.0, 0.0, 2.0));
        match &page.elements[1].content {
            ElementContent::Chart(chart) => {
                assert_eq!(chart.series_values, vec![vec![None, Some(3.0)]]);
            }
            other => panic!("expected chart, got {other:?}"),
        }

        let json = serde_json::to_string(&first).unwrap();
        let parsed: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, first);
    }
}
