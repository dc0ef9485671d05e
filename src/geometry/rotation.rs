use crate::model::{PageMeta, PageSpaceRect, Rotation};

/// Rotation inference looks at no more than this many elements per page.
pub const MAX_ROTATION_SAMPLES: usize = 250;

/// Weight of linear overflow relative to overflow area.
const EDGE_PENALTY_WEIGHT: f64 = 5.0;
/// Bonus subtracted from the declared rotation's score so exact ties keep it.
const DECLARED_ROTATION_BONUS: f64 = 1e-6;

/// Map a point of the unrotated source frame into the display frame.
///
/// The display frame is `page_w` x `page_h`; for quarter turns the source
/// frame has those dimensions swapped. Rotation is clockwise.
fn rotate_point(x: f64, y: f64, rotation: Rotation, page_w: f64, page_h: f64) -> (f64, f64) {
    let (src_w, src_h) = if rotation.is_quarter_turn() {
        (page_h, page_w)
    } else {
        (page_w, page_h)
    };
    match rotation {
        Rotation::Deg0 => (x, y),
        Rotation::Deg90 => (src_h - y, x),
        Rotation::Deg180 => (src_w - x, src_h - y),
        Rotation::Deg270 => (y, src_w - x),
    }
}

/// Rotate all four corners and take the axis-aligned box around them.
pub fn rotate_rect(rect: &PageSpaceRect, rotation: Rotation, page_w: f64, page_h: f64) -> PageSpaceRect {
    if rotation == Rotation::Deg0 {
        return *rect;
    }
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (x, y) in rect.corners() {
        let (rx, ry) = rotate_point(x, y, rotation, page_w, page_h);
        min_x = min_x.min(rx);
        min_y = min_y.min(ry);
        max_x = max_x.max(rx);
        max_y = max_y.max(ry);
    }
    PageSpaceRect::from_edges(min_x, min_y, max_x, max_y)
}

/// Overflow area plus weighted linear overflow of `rect` beyond the page edges.
pub fn out_of_bounds_score(rect: &PageSpaceRect, page_w: f64, page_h: f64) -> f64 {
    let over_left = (-rect.left).max(0.0);
    let over_top = (-rect.top).max(0.0);
    let over_right = (rect.right() - page_w).max(0.0);
    let over_bottom = (rect.bottom() - page_h).max(0.0);

    let area_penalty =
        (over_left + over_right) * rect.height + (over_top + over_bottom) * rect.width;
    let edge_penalty = over_left + over_top + over_right + over_bottom;
    area_penalty + EDGE_PENALTY_WEIGHT * edge_penalty
}

pub fn score_rotation(samples: &[PageSpaceRect], rotation: Rotation, page: &PageMeta) -> f64 {
    samples
        .iter()
        .map(|r| {
            let rotated = rotate_rect(r, rotation, page.width, page.height);
            out_of_bounds_score(&rotated, page.width, page.height)
        })
        .sum()
}

/// Pick the rotation under which the sampled rectangles spill least outside
/// the page. Exact ties resolve to the page's declared rotation, then to the
/// smaller angle.
pub fn infer_rotation(samples: &[PageSpaceRect], page: &PageMeta) -> Rotation {
    if samples.is_empty() {
        return page.rotation;
    }
    let samples = &samples[..samples.len().min(MAX_ROTATION_SAMPLES)];

    let scored: Vec<(Rotation, f64)> = Rotation::ALL
        .iter()
        .map(|&rot| {
            let mut score = score_rotation(samples, rot, page);
            if rot == page.rotation {
                score -= DECLARED_ROTATION_BONUS;
            }
            (rot, score)
        })
        .collect();

    let best = scored
        .iter()
        .copied()
        .min_by(|(ra, a), (rb, b)| {
            a.total_cmp(b)
                .then_with(|| (*ra != page.rotation).cmp(&(*rb != page.rotation)))
        })
        .map(|(rot, _)| rot)
        .unwrap_or(page.rotation);

    log::debug!(
        "Page {}: rotation scores {:?} -> {}° (declared {}°)",
        page.page_no,
        scored
            .iter()
            .map(|(r, s)| (r.degrees(), (s * 100.0).round() / 100.0))
            .collect::<Vec<_>>(),
        best.degrees(),
        page.rotation.degrees()
    );
    best
}
