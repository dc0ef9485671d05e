use serde::Serialize;

use crate::model::{PageMeta, RawElement};

/// Extents up to this value on both axes are read as page fractions.
const NORMALIZED_MAX: f64 = 1.5;
/// Extent/page-size ratio range accepted as native page points.
const POINTS_MIN_RATIO: f64 = 0.5;
const POINTS_MAX_RATIO: f64 = 1.25;

/// Unit system of the alternate (x/y/width/height) geometry on a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateUnits {
    /// Fractions of the page, 0..1.
    Normalized,
    /// Already in page points.
    Points,
    /// Rasterization pixels of unknown DPI, fitted to the page.
    Pixels,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ResolvedScale {
    pub units: CoordinateUnits,
    pub sx: f64,
    pub sy: f64,
}

impl ResolvedScale {
    pub const IDENTITY: ResolvedScale = ResolvedScale {
        units: CoordinateUnits::Points,
        sx: 1.0,
        sy: 1.0,
    };
}

/// Classify the alternate-form geometry of one page's elements and derive the
/// factors that take it to page points.
pub fn resolve_scale<'a>(
    page: &PageMeta,
    elements: impl IntoIterator<Item = &'a RawElement>,
) -> ResolvedScale {
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut count = 0usize;
    for (x, y, w, h) in elements.into_iter().filter_map(RawElement::alternate_geometry) {
        max_x = max_x.max(x).max(x + w);
        max_y = max_y.max(y).max(y + h);
        count += 1;
    }

    if count == 0 {
        return ResolvedScale::IDENTITY;
    }

    let resolved = if max_x <= NORMALIZED_MAX && max_y <= NORMALIZED_MAX {
        ResolvedScale {
            units: CoordinateUnits::Normalized,
            sx: page.width,
            sy: page.height,
        }
    } else if within_page_ratio(max_x, page.width) && within_page_ratio(max_y, page.height) {
        ResolvedScale::IDENTITY
    } else if max_x > 0.0 && max_y > 0.0 {
        ResolvedScale {
            units: CoordinateUnits::Pixels,
            sx: page.width / max_x,
            sy: page.height / max_y,
        }
    } else {
        // Extent collapsed at or below zero on one axis: nothing to fit against.
        ResolvedScale::IDENTITY
    };

    log::debug!(
        "Page {}: {} alternate-form elements, extent {:.2}x{:.2} -> {:?} (sx={:.4}, sy={:.4})",
        page.page_no,
        count,
        max_x,
        max_y,
        resolved.units,
        resolved.sx,
        resolved.sy
    );
    resolved
}

fn within_page_ratio(extent: f64, page_dim: f64) -> bool {
    extent >= page_dim * POINTS_MIN_RATIO && extent <= page_dim * POINTS_MAX_RATIO
}
