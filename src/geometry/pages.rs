use std::collections::BTreeMap;

use crate::model::{PageMeta, RawElement, RawPage, Rotation};

/// A4-ish fallback page size in points.
pub const DEFAULT_PAGE_WIDTH: f64 = 595.0;
pub const DEFAULT_PAGE_HEIGHT: f64 = 841.0;

pub fn default_page(page_no: i64) -> PageMeta {
    PageMeta {
        page_no,
        width: DEFAULT_PAGE_WIDTH,
        height: DEFAULT_PAGE_HEIGHT,
        rotation: Rotation::Deg0,
    }
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|n| n.is_finite() && *n > 0.0)
}

/// Build canonical page metadata, sorted ascending by page number.
///
/// Explicit page entries win; any page number referenced by an element but
/// missing from `pages` gets a default page so every element resolves to
/// exactly one `PageMeta`. With neither pages nor references, a single page 1
/// is synthesized.
pub fn normalize_pages(pages: &[RawPage], elements: &[RawElement]) -> Vec<PageMeta> {
    let mut by_number: BTreeMap<i64, PageMeta> = BTreeMap::new();

    for (i, raw) in pages.iter().enumerate() {
        let page_no = raw.page_number.unwrap_or(i as i64 + 1);
        if by_number.contains_key(&page_no) {
            log::debug!("Duplicate page metadata for page {page_no}; keeping the first entry");
            continue;
        }
        let width = positive(raw.width).unwrap_or_else(|| {
            log::debug!("Page {page_no}: missing width, defaulting to {DEFAULT_PAGE_WIDTH}");
            DEFAULT_PAGE_WIDTH
        });
        let height = positive(raw.height).unwrap_or_else(|| {
            log::debug!("Page {page_no}: missing height, defaulting to {DEFAULT_PAGE_HEIGHT}");
            DEFAULT_PAGE_HEIGHT
        });
        let rotation = raw
            .rotation
            .and_then(Rotation::from_degrees)
            .unwrap_or_default();
        by_number.insert(
            page_no,
            PageMeta {
                page_no,
                width,
                height,
                rotation,
            },
        );
    }

    let mut synthesized = 0usize;
    for page_no in elements.iter().filter_map(RawElement::declared_page) {
        by_number.entry(page_no).or_insert_with(|| {
            synthesized += 1;
            default_page(page_no)
        });
    }
    if synthesized > 0 && !pages.is_empty() {
        log::debug!("{synthesized} referenced page(s) had no metadata; using default page size");
    }

    if by_number.is_empty() {
        log::debug!("No page metadata or page references; synthesizing page 1");
        return vec![default_page(1)];
    }

    by_number.into_values().collect()
}
