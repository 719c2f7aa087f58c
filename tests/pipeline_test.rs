//! Integration tests for decoding a response archive into extractor output.

use std::io::{Cursor, Write};

use datainsight::{
    archive, build_chunks, collect_tables, collect_text, decode_response, normalize, ElementKind,
    Error,
};
use serde_json::json;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn archive_with(members: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in members {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn hello_tree() -> serde_json::Value {
    json!({
        "docName": "hello.pdf",
        "totalPages": 1,
        "pages": [{
            "pageNum": 1,
            "pageWidth": 595.0,
            "pageHeight": 842.0,
            "extractionSummary": {"text": 1, "table": 1},
            "elements": [
                {"type": "text", "id": "t1", "content": {"text": "hello"}},
                {"type": "table", "id": "tb1", "content": {"csv": "a,b\n1,2", "html": "<table></table>"}}
            ]
        }]
    })
}

#[test]
fn test_round_trip_text_and_table() {
    let doc = normalize(&hello_tree()).unwrap();

    assert_eq!(collect_text(&doc), vec!["hello"]);
    assert_eq!(collect_tables(&doc), vec!["a,b\n1,2"]);
}

#[test]
fn test_chunks_follow_element_order() {
    let doc = normalize(&hello_tree()).unwrap();
    let chunks = build_chunks(&doc);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].element_type, "text");
    assert_eq!(chunks[0].text, "hello");
    assert_eq!(chunks[1].element_type, "table");
    assert_eq!(chunks[1].text, "a,b\n1,2");
    assert!(chunks.iter().all(|c| c.page_number == 1));
    assert!(chunks.iter().all(|c| c.document == "hello.pdf"));
}

#[test]
fn test_full_pipeline_from_archive() {
    let payload = hello_tree().to_string();
    let bytes = archive_with(&[("images/p1.png", "png"), ("result.json", &payload)]);

    let doc = decode_response(&bytes).unwrap();
    assert_eq!(doc.name, "hello.pdf");
    assert_eq!(collect_text(&doc), vec!["hello"]);
}

#[test]
fn test_normalize_is_idempotent() {
    let tree = hello_tree();
    assert_eq!(normalize(&tree).unwrap(), normalize(&tree).unwrap());
}

#[test]
fn test_missing_payload_lists_members() {
    let bytes = archive_with(&[("images/p1.png", "png"), ("notes.txt", "n")]);

    match decode_response(&bytes).unwrap_err() {
        Error::MissingPayload { members } => {
            assert_eq!(members, vec!["images/p1.png", "notes.txt"]);
        }
        other => panic!("expected MissingPayload, got {other:?}"),
    }
}

#[test]
fn test_invalid_payload() {
    let bytes = archive_with(&[("result.json", "{\"pages\": [")]);
    assert!(matches!(
        archive::decode(&bytes),
        Err(Error::PayloadParse { .. })
    ));
}

#[test]
fn test_missing_page_list_is_schema_error() {
    let bytes = archive_with(&[("result.json", r#"{"docName": "a.pdf"}"#)]);

    let err = decode_response(&bytes).unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));
    assert!(!err.is_retryable());
}

#[test]
fn test_missing_extraction_summary_defaults_to_empty() {
    let tree = json!({
        "docName": "a.pdf",
        "pages": [{"pageNum": 1, "elements": []}]
    });

    let doc = normalize(&tree).unwrap();
    assert!(doc.pages[0].extraction_summary.is_empty());
}

#[test]
fn test_unknown_element_passes_through() {
    let tree = json!({
        "docName": "a.pdf",
        "pages": [{
            "pageNum": 1,
            "elements": [
                {"type": "hologram", "id": "h1", "content": {"text": "from the future"}},
                {"type": "text", "id": "t1", "content": {"text": "body"}}
            ]
        }]
    });

    let doc = normalize(&tree).unwrap();
    let first = &doc.pages[0].elements[0];
    assert_eq!(first.kind(), ElementKind::Other);
    assert_eq!(first.type_tag(), "hologram");

    // Only text elements feed the text extractor; chunks take any text
    assert_eq!(collect_text(&doc), vec!["body"]);
    let chunks = build_chunks(&doc);
    assert_eq!(chunks[0].element_type, "hologram");
    assert_eq!(chunks[0].text, "from the future");
}

#[test]
fn test_chunks_skip_blank_content() {
    let tree = json!({
        "docName": "a.pdf",
        "pages": [
            {"pageNum": 1, "elements": [
                {"type": "text", "id": "t1", "content": {"text": "   "}},
                {"type": "image", "id": "i1", "content": {"src": "img.png"}},
                {"type": "table", "id": "tb1", "content": {"csv": ""}}
            ]},
            {"pageNum": 2, "elements": [
                {"type": "equation", "id": "e1", "content": {"text": " x^2 "}}
            ]}
        ]
    });

    let doc = normalize(&tree).unwrap();
    let chunks = build_chunks(&doc);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].page_number, 2);
    assert_eq!(chunks[0].text, "x^2");
    assert!(collect_tables(&doc).is_empty());
}

#[test]
fn test_text_order_across_pages() {
    let tree = json!({
        "docName": "a.pdf",
        "pages": [
            {"pageNum": 1, "elements": [
                {"type": "text", "id": "a", "content": {"text": "one"}},
                {"type": "chart", "id": "c", "content": {"title": "Sales", "csv": "q,v\nQ1,3"}},
                {"type": "text", "id": "b", "content": {"text": "two"}}
            ]},
            {"pageNum": 2, "elements": [
                {"type": "text", "id": "c2", "content": {"text": "three"}}
            ]}
        ]
    });

    let doc = normalize(&tree).unwrap();
    assert_eq!(collect_text(&doc), vec!["one", "two", "three"]);
}
