#![allow(dead_code)]

use page_recon::model::{BBox, PageMeta, PageSpaceRect, Provenance, RawElement, RawPage, Rotation};

pub const EPS: f64 = 1e-6;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "{what}: expected {expected}, got {actual}"
    );
}

pub fn assert_rect(actual: &PageSpaceRect, expected: (f64, f64, f64, f64)) {
    let (l, t, w, h) = expected;
    assert_close(actual.left, l, "left");
    assert_close(actual.top, t, "top");
    assert_close(actual.width, w, "width");
    assert_close(actual.height, h, "height");
}

pub fn page(page_no: i64, width: f64, height: f64) -> PageMeta {
    PageMeta {
        page_no,
        width,
        height,
        rotation: Rotation::Deg0,
    }
}

pub fn raw_page(page_no: i64, width: f64, height: f64) -> RawPage {
    RawPage {
        page_number: Some(page_no),
        width: Some(width),
        height: Some(height),
        rotation: None,
    }
}

/// Element with x/y/width/height geometry only.
pub fn xywh(page: i64, x: f64, y: f64, w: f64, h: f64) -> RawElement {
    RawElement {
        page: Some(page),
        x: Some(x),
        y: Some(y),
        width: Some(w),
        height: Some(h),
        ..RawElement::default()
    }
}

/// Element with a single provenance bbox.
pub fn with_bbox(page: i64, bbox: BBox) -> RawElement {
    RawElement {
        prov: vec![Provenance {
            page_no: Some(page),
            bbox: Some(bbox),
        }],
        ..RawElement::default()
    }
}

pub fn text_el(page: i64, text: &str, x: f64, y: f64, w: f64, h: f64) -> RawElement {
    RawElement {
        text: Some(text.to_string()),
        ..xywh(page, x, y, w, h)
    }
}
