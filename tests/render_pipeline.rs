mod common;

use std::collections::HashSet;

use serde_json::json;

use page_recon::geometry::scale::CoordinateUnits;
use page_recon::input::parse_bytes;
use page_recon::model::Rotation;
use page_recon::{
    BuiltinMetrics, Error, RenderOptions, SourceDocument, render_current_page, render_document,
    render_to_pdf,
};

use common::assert_rect;

fn payload() -> serde_json::Value {
    json!({
        "pages": [
            { "page_number": 1, "width": 600, "height": 800 },
            { "page_no": "2", "page_width": "600", "page_height": "800", "rotate": 0 },
        ],
        "coordinates": [
            {
                "text": "Hello", "label": "text",
                "prov": [{ "page_no": 1, "bbox": { "l": 100, "t": 100, "r": 150, "b": 112 } }],
            },
            {
                "text": "World", "label": "text",
                "prov": [{ "page_no": 1, "bbox": [152, 100, 200, 112] }],
            },
            {
                "isTable": true, "tableIndex": 0, "label": "table",
                "prov": [{ "page_no": 1, "bbox": { "l": 100, "t": 200, "r": 400, "b": 300 } }],
            },
            {
                "text": "   ", "orig": "",
                "prov": [{ "page_no": 1, "bbox": { "l": 10, "t": 10, "r": 20, "b": 20 } }],
            },
            {
                "orig": "Second",
                "prov": { "page_no": 2, "bbox": {
                    "l": 50, "t": 750, "r": 150, "b": 730, "coord_origin": "BOTTOMLEFT"
                } },
            },
            {
                "label": "table", "table_index": 5, "page": 2,
                "prov": [{ "page_no": 2, "bbox": { "l": 100, "t": 200, "r": 400, "b": 300 } }],
            },
            { "text": "Loose", "x": 300, "y": 600, "width": 100, "height": 20 },
        ],
        "tables": [
            { "headers": ["A", "B"], "grid": [["1", "2"]] },
        ],
    })
}

fn document() -> SourceDocument {
    let bytes = serde_json::to_vec(&payload()).expect("serialize payload");
    parse_bytes(&bytes).expect("decode payload")
}

fn highlight(indices: &[usize]) -> RenderOptions {
    RenderOptions {
        highlighted: indices.iter().copied().collect::<HashSet<_>>(),
    }
}

#[test]
fn payload_fields_are_read_leniently() {
    let doc = document();
    assert_eq!(doc.coordinates.len(), 7);
    assert_eq!(doc.pages[1].page_number, Some(2));
    assert_eq!(doc.pages[1].width, Some(600.0));
    assert_eq!(doc.pages[1].rotation, Some(0.0));
    assert!(doc.coordinates[2].is_table_element());
    assert!(doc.coordinates[5].is_table_element());
    assert_eq!(doc.coordinates[5].table_index, Some(5));
    assert_eq!(doc.coordinates[4].display_text(), "Second");
    assert_eq!(doc.coordinates[4].declared_page(), Some(2));
    assert_eq!(doc.coordinates[6].declared_page(), None);
}

#[test]
fn elements_alias_is_accepted() {
    let doc = parse_bytes(br#"{"elements": [{"text": "x", "page": 3}]}"#).expect("decode");
    assert_eq!(doc.coordinates.len(), 1);
    assert_eq!(doc.coordinates[0].page, Some(3));
    assert!(doc.tables.is_empty());
}

#[test]
fn malformed_json_is_invalid_input() {
    let err = parse_bytes(b"{ not json").unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)), "{err}");
}

#[test]
fn document_renders_page_by_page() {
    common::init_logging();
    let doc = document();
    let pages = render_document(&doc, &BuiltinMetrics, &highlight(&[1]));
    assert_eq!(pages.len(), 2);

    let first = &pages[0];
    assert_eq!(first.page.page_no, 1);
    assert_eq!(first.rotation, Rotation::Deg0);
    assert_eq!(first.units, CoordinateUnits::Points);

    let texts: Vec<&str> = first.text_runs.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello World", "Loose"]);
    let hello = &first.text_runs[0];
    assert_eq!(hello.source_indices, vec![0, 1]);
    assert!(hello.highlighted);
    assert_rect(&hello.rect, (100.0, 100.0, 100.0, 12.0));
    assert!(!first.text_runs[1].highlighted);
    assert_rect(&first.text_runs[1].rect, (300.0, 600.0, 100.0, 20.0));

    assert_eq!(first.tables.len(), 1);
    let table = &first.tables[0];
    assert_eq!(table.element_index, 2);
    assert_eq!(table.model.headers, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(table.placeholder(), None);

    let second = &pages[1];
    assert_eq!(second.text_runs.len(), 1);
    assert_eq!(second.text_runs[0].text, "Second");
    assert_rect(&second.text_runs[0].rect, (50.0, 50.0, 100.0, 20.0));
    assert_eq!(second.tables[0].placeholder(), Some("no data"));
}

#[test]
fn fitted_text_stays_inside_its_run() {
    let doc = document();
    for page in render_document(&doc, &BuiltinMetrics, &RenderOptions::default()) {
        for run in &page.text_runs {
            let size = run.fitted.font_size();
            assert!(size >= 1.0 && size <= run.rect.height, "{} at {size}pt", run.text);
        }
    }
}

#[test]
fn clicks_resolve_to_input_positions() {
    let doc = document();
    let page = render_current_page(&doc, 1, &BuiltinMetrics, &RenderOptions::default())
        .expect("page 1");
    assert_eq!(page.hit_test(175.0, 105.0), Some(0));
    assert_eq!(page.hit_test(250.0, 250.0), Some(2));
    assert_eq!(page.hit_test(320.0, 610.0), Some(6));
    assert_eq!(page.hit_test(5.0, 5.0), None);
}

#[test]
fn current_page_clamps_to_the_nearest_page() {
    let doc = document();
    let metrics = BuiltinMetrics;
    let options = RenderOptions::default();
    let last = render_current_page(&doc, 9, &metrics, &options).expect("clamped page");
    assert_eq!(last.page.page_no, 2);
    let first = render_current_page(&doc, -1, &metrics, &options).expect("clamped page");
    assert_eq!(first.page.page_no, 1);
}

#[test]
fn unreferenced_elements_follow_the_current_page() {
    let doc = document();
    let page = render_current_page(&doc, 2, &BuiltinMetrics, &RenderOptions::default())
        .expect("page 2");
    let texts: Vec<&str> = page.text_runs.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["Second", "Loose"]);
}

#[test]
fn repeated_passes_are_identical() {
    let doc = document();
    let a = render_document(&doc, &BuiltinMetrics, &RenderOptions::default());
    let b = render_document(&doc, &BuiltinMetrics, &RenderOptions::default());
    assert_eq!(a, b);
}

#[test]
fn render_model_serializes_to_json() {
    let doc = document();
    let pages = render_document(&doc, &BuiltinMetrics, &RenderOptions::default());
    let value = serde_json::to_value(&pages).expect("serialize");
    assert_eq!(value[0]["rotation"], json!(0));
    assert_eq!(value[0]["units"], json!("points"));
    assert_eq!(value[0]["text_runs"][0]["fitted"]["role"], json!("body"));
    assert_eq!(value[1]["tables"][0]["model"]["col_count"], json!(1));
}

#[test]
fn pdf_export_produces_a_document() {
    let doc = document();
    let pages = render_document(&doc, &BuiltinMetrics, &highlight(&[2]));
    let bytes = render_to_pdf(&pages, &BuiltinMetrics).expect("pdf");
    assert!(bytes.starts_with(b"%PDF"), "missing PDF header");
    assert!(bytes.len() > 500);
}

#[test]
fn pdf_export_needs_pages() {
    let err = render_to_pdf(&[], &BuiltinMetrics).unwrap_err();
    assert!(matches!(err, Error::Pdf(_)));
}

#[test]
fn json_file_converts_to_pdf_file() {
    let dir = std::env::temp_dir().join(format!("page-recon-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let input = dir.join("layout.json");
    let output = dir.join("layout.pdf");
    std::fs::write(&input, serde_json::to_vec(&payload()).expect("serialize")).expect("write");

    page_recon::reconstruct_json_to_pdf(&input, &output).expect("convert");
    let bytes = std::fs::read(&output).expect("read pdf");
    assert!(bytes.starts_with(b"%PDF"));

    let missing = page_recon::reconstruct_json_to_pdf(&dir.join("absent.json"), &output);
    assert!(matches!(missing, Err(Error::Io(_))));
    let _ = std::fs::remove_dir_all(&dir);
}
