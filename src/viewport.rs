//! Zoom, fit mode and page navigation.
//!
//! The host speaks in external page numbers that may be zero- or one-based.
//! Internally pages are addressed by their index in the sorted page list; the
//! mapping between the two is rebuilt from scratch whenever the page set
//! changes.

use serde::Serialize;

use crate::model::PageMeta;

pub const MIN_SCALE: f64 = 0.2;
pub const MAX_SCALE: f64 = 2.5;
pub const ZOOM_STEP: f64 = 0.1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    #[default]
    None,
    Width,
    Page,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewportState {
    pub scale: f64,
    pub fit_mode: FitMode,
    pub external_current_page: i64,
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    // Round away accumulated float error from repeated steps. Infinities clamp.
    let rounded = (scale * 100.0).round() / 100.0;
    rounded.clamp(MIN_SCALE, MAX_SCALE)
}

/// External page number <-> internal page index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageNumbering {
    page_numbers: Vec<i64>,
    zero_based: bool,
}

impl PageNumbering {
    pub fn new(pages: &[PageMeta]) -> Self {
        let mut page_numbers: Vec<i64> = pages.iter().map(|p| p.page_no).collect();
        page_numbers.sort_unstable();
        page_numbers.dedup();
        let zero_based =
            page_numbers.binary_search(&0).is_ok() && page_numbers.binary_search(&1).is_err();
        Self {
            page_numbers,
            zero_based,
        }
    }

    /// True when the page set contains page 0 but not page 1.
    pub fn is_zero_based(&self) -> bool {
        self.zero_based
    }

    /// Offset between the first internal index and its external number.
    pub fn base(&self) -> i64 {
        if self.zero_based { 0 } else { 1 }
    }

    pub fn len(&self) -> usize {
        self.page_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page_numbers.is_empty()
    }

    /// Internal index of an external page number. Unknown numbers clamp to
    /// the nearest existing page (the lower one on ties).
    pub fn external_to_internal(&self, external: i64) -> Option<usize> {
        match self.page_numbers.binary_search(&external) {
            Ok(i) => Some(i),
            Err(_) if self.page_numbers.is_empty() => None,
            Err(0) => Some(0),
            Err(i) if i >= self.page_numbers.len() => Some(self.page_numbers.len() - 1),
            Err(i) => {
                let below = external - self.page_numbers[i - 1];
                let above = self.page_numbers[i] - external;
                Some(if above < below { i } else { i - 1 })
            }
        }
    }

    /// External number of an internal index; out-of-range indices clamp.
    pub fn internal_to_external(&self, index: usize) -> Option<i64> {
        let last = self.page_numbers.len().checked_sub(1)?;
        Some(self.page_numbers[index.min(last)])
    }
}

/// Zoom and page selection for one viewer.
pub struct Viewport {
    scale: f64,
    fit_mode: FitMode,
    current: usize,
    numbering: PageNumbering,
    page_sizes: Vec<(f64, f64)>,
    container: Option<(f64, f64)>,
    on_page_change: Option<Box<dyn FnMut(i64)>>,
}

impl Viewport {
    pub fn new(pages: &[PageMeta]) -> Self {
        let mut viewport = Self {
            scale: 1.0,
            fit_mode: FitMode::None,
            current: 0,
            numbering: PageNumbering::default(),
            page_sizes: Vec::new(),
            container: None,
            on_page_change: None,
        };
        viewport.set_pages(pages);
        viewport
    }

    /// Register the host callback notified with external page numbers.
    pub fn on_page_change(&mut self, callback: impl FnMut(i64) + 'static) {
        self.on_page_change = Some(Box::new(callback));
    }

    pub fn state(&self) -> ViewportState {
        ViewportState {
            scale: self.scale,
            fit_mode: self.fit_mode,
            external_current_page: self.current_page().unwrap_or(0),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    pub fn numbering(&self) -> &PageNumbering {
        &self.numbering
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale - ZOOM_STEP);
    }

    /// Manual zoom. Leaves any fit mode.
    pub fn set_scale(&mut self, scale: f64) {
        self.fit_mode = FitMode::None;
        self.scale = clamp_scale(scale);
    }

    pub fn set_fit_mode(&mut self, mode: FitMode) {
        self.fit_mode = mode;
        self.refit();
    }

    /// Available size of the scroll container, in screen units at scale 1.
    pub fn set_container_size(&mut self, width: f64, height: f64) {
        self.container = Some((width, height));
        self.refit();
    }

    /// Replace the page set. The current external page is kept when it still
    /// exists, otherwise it clamps to the nearest page.
    pub fn set_pages(&mut self, pages: &[PageMeta]) {
        let previous = self.current_page();
        let mut sorted: Vec<&PageMeta> = pages.iter().collect();
        sorted.sort_by_key(|p| p.page_no);
        sorted.dedup_by_key(|p| p.page_no);
        self.page_sizes = sorted.iter().map(|p| (p.width, p.height)).collect();
        self.numbering = PageNumbering::new(pages);
        self.current = previous
            .and_then(|p| self.numbering.external_to_internal(p))
            .unwrap_or(0);
        log::debug!(
            "Viewport: {} pages, {}-based numbering",
            self.numbering.len(),
            self.numbering.base()
        );
        self.refit();
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Current page in the host's numbering.
    pub fn current_page(&self) -> Option<i64> {
        self.numbering.internal_to_external(self.current)
    }

    pub fn current_page_size(&self) -> Option<(f64, f64)> {
        self.page_sizes.get(self.current).copied()
    }

    /// Follow a page number pushed by the host. Does not notify back.
    pub fn sync_external_page(&mut self, external: i64) {
        if let Some(index) = self.numbering.external_to_internal(external) {
            self.select(index, false);
        }
    }

    /// Navigate to an external page number, clamping to the nearest page.
    /// Returns the page actually selected.
    pub fn go_to_page(&mut self, external: i64) -> Option<i64> {
        let index = self.numbering.external_to_internal(external)?;
        self.select(index, true);
        self.current_page()
    }

    pub fn next_page(&mut self) -> Option<i64> {
        if self.current + 1 < self.numbering.len() {
            self.select(self.current + 1, true);
        }
        self.current_page()
    }

    pub fn prev_page(&mut self) -> Option<i64> {
        if self.current > 0 {
            self.select(self.current - 1, true);
        }
        self.current_page()
    }

    fn select(&mut self, index: usize, notify: bool) {
        let changed = index != self.current;
        let size_changed = self.page_sizes.get(index) != self.page_sizes.get(self.current);
        self.current = index;
        if size_changed {
            self.refit();
        }
        if changed
            && notify
            && let Some(external) = self.current_page()
            && let Some(callback) = self.on_page_change.as_mut()
        {
            callback(external);
        }
    }

    /// Recompute the scale for the active fit mode.
    fn refit(&mut self) {
        let (Some((avail_w, avail_h)), Some((page_w, page_h))) =
            (self.container, self.current_page_size())
        else {
            return;
        };
        if page_w <= 0.0 || page_h <= 0.0 {
            return;
        }
        let scale = match self.fit_mode {
            FitMode::None => return,
            FitMode::Width => avail_w / page_w,
            FitMode::Page => (avail_w / page_w).min(avail_h / page_h),
        };
        self.scale = clamp_scale(scale);
    }
}
