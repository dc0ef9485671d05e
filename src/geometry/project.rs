use crate::model::{BBox, PageMeta, PageSpaceRect, RawElement};

use super::PageFrame;
use super::rotation::rotate_rect;
use super::scale::ResolvedScale;

/// The provenance bbox for `page_no`, else the first bbox the element carries.
fn pick_bbox(el: &RawElement, page_no: i64) -> Option<&BBox> {
    el.prov
        .iter()
        .filter(|p| p.page_no == Some(page_no))
        .find_map(|p| p.bbox.as_ref())
        .or_else(|| el.prov.iter().find_map(|p| p.bbox.as_ref()))
}

fn bbox_rect(bbox: &BBox, page: &PageMeta) -> Option<PageSpaceRect> {
    let left = bbox.l.min(bbox.r);
    let right = bbox.l.max(bbox.r);
    let (lo, hi) = (bbox.t.min(bbox.b), bbox.t.max(bbox.b));
    let top = if bbox.is_bottom_origin() {
        page.height - hi
    } else {
        lo
    };
    let rect = PageSpaceRect::new(left, top, right - left, hi - lo);
    rect.is_finite().then_some(rect)
}

fn alternate_rect(el: &RawElement, scale: &ResolvedScale) -> Option<PageSpaceRect> {
    let (x, y, w, h) = el.alternate_geometry()?;
    let (mut left, mut top) = (x * scale.sx, y * scale.sy);
    let (mut width, mut height) = (w * scale.sx, h * scale.sy);
    if width < 0.0 {
        left += width;
        width = -width;
    }
    if height < 0.0 {
        top += height;
        height = -height;
    }
    let rect = PageSpaceRect::new(left, top, width, height);
    rect.is_finite().then_some(rect)
}

/// Page-space rectangle before rotation: the provenance bbox when usable,
/// otherwise the scaled alternate geometry.
pub fn base_rect(el: &RawElement, page: &PageMeta, scale: &ResolvedScale) -> Option<PageSpaceRect> {
    pick_bbox(el, page.page_no)
        .and_then(|bbox| bbox_rect(bbox, page))
        .or_else(|| alternate_rect(el, scale))
        .filter(|r| r.width >= 0.0 && r.height >= 0.0)
}

/// Project one element into the rotated frame it is rendered in. Returns `None`
/// for anything that would not be drawable.
pub fn project(el: &RawElement, frame: &PageFrame) -> Option<PageSpaceRect> {
    let rect = base_rect(el, &frame.meta, &frame.scale)?;
    let rotated = rotate_rect(&rect, frame.rotation, frame.meta.width, frame.meta.height);
    rotated.is_renderable().then_some(rotated)
}
