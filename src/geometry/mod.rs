//! Page-space geometry: page normalization, unit resolution, rotation
//! inference and per-element projection.

pub mod pages;
pub mod project;
pub mod rotation;
pub mod scale;

use std::collections::HashMap;

use crate::model::{PageMeta, PageSpaceRect, RawElement, Rotation};

use rotation::{MAX_ROTATION_SAMPLES, infer_rotation};
use scale::{ResolvedScale, resolve_scale};

/// Everything the projector needs to place an element on one page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageFrame {
    pub meta: PageMeta,
    pub scale: ResolvedScale,
    pub rotation: Rotation,
}

/// One render pass over immutable inputs.
///
/// Page frames (resolved scale and inferred rotation) are computed the first
/// time a page is asked for and memoized by page number for the lifetime of
/// the pass. A new pass starts from an empty memo.
pub struct LayoutPass<'a> {
    elements: &'a [RawElement],
    pages: &'a [PageMeta],
    fallback_page: i64,
    /// Page number -> position in `pages`.
    page_index: HashMap<i64, usize>,
    /// Page number -> input positions of its elements, ascending.
    by_page: HashMap<i64, Vec<usize>>,
    frames: HashMap<i64, PageFrame>,
}

impl<'a> LayoutPass<'a> {
    /// `current_page` is the page elements without any page reference are
    /// assigned to. It snaps to the nearest known page.
    pub fn new(elements: &'a [RawElement], pages: &'a [PageMeta], current_page: i64) -> Self {
        let fallback_page = nearest_page(pages, current_page).unwrap_or(current_page);
        let mut page_index = HashMap::with_capacity(pages.len());
        for (i, page) in pages.iter().enumerate() {
            page_index.entry(page.page_no).or_insert(i);
        }
        let mut by_page: HashMap<i64, Vec<usize>> = HashMap::new();
        for (i, el) in elements.iter().enumerate() {
            let page_no = resolve_page(&page_index, el, fallback_page);
            by_page.entry(page_no).or_default().push(i);
        }
        Self {
            elements,
            pages,
            fallback_page,
            page_index,
            by_page,
            frames: HashMap::new(),
        }
    }

    pub fn pages(&self) -> &'a [PageMeta] {
        self.pages
    }

    pub fn elements(&self) -> &'a [RawElement] {
        self.elements
    }

    pub fn page_meta(&self, page_no: i64) -> Option<&'a PageMeta> {
        let pages = self.pages;
        self.page_index.get(&page_no).and_then(|&i| pages.get(i))
    }

    /// The page an element belongs to.
    pub fn page_of(&self, el: &RawElement) -> i64 {
        resolve_page(&self.page_index, el, self.fallback_page)
    }

    /// Elements on `page_no` with their positions in the input array.
    pub fn elements_on(&self, page_no: i64) -> impl Iterator<Item = (usize, &'a RawElement)> + '_ {
        let elements = self.elements;
        self.by_page
            .get(&page_no)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&i| (i, &elements[i]))
    }

    pub fn frame(&mut self, page_no: i64) -> Option<PageFrame> {
        if let Some(frame) = self.frames.get(&page_no) {
            return Some(*frame);
        }
        let meta = *self.page_meta(page_no)?;
        let on_page: Vec<&RawElement> = self.elements_on(page_no).map(|(_, el)| el).collect();

        let scale = resolve_scale(&meta, on_page.iter().copied());
        let samples: Vec<PageSpaceRect> = on_page
            .iter()
            .take(MAX_ROTATION_SAMPLES)
            .filter_map(|el| project::base_rect(el, &meta, &scale))
            .collect();
        let rotation = infer_rotation(&samples, &meta);

        let frame = PageFrame {
            meta,
            scale,
            rotation,
        };
        self.frames.insert(page_no, frame);
        Some(frame)
    }

    /// Project the element at `index` onto its page.
    pub fn project(&mut self, index: usize) -> Option<PageSpaceRect> {
        let el = self.elements.get(index)?;
        let frame = self.frame(self.page_of(el))?;
        project::project(el, &frame)
    }
}

fn resolve_page(page_index: &HashMap<i64, usize>, el: &RawElement, fallback: i64) -> i64 {
    el.declared_page()
        .filter(|p| page_index.contains_key(p))
        .unwrap_or(fallback)
}

/// The page numbered `page_no`, or the closest one (lower on ties).
pub fn nearest_page(pages: &[PageMeta], page_no: i64) -> Option<i64> {
    pages
        .iter()
        .min_by_key(|p| ((p.page_no - page_no).abs(), p.page_no))
        .map(|p| p.page_no)
}
