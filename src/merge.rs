//! Text line merging.
//!
//! Upstream detections are often per word or per glyph. Fragments are first
//! clustered into lines by vertical midpoint, then adjacent fragments within
//! a line are joined into runs. This approximates reading order without a
//! general layout solver.

use crate::model::{MergedElement, PageSpaceRect};

const LINE_TOLERANCE_MIN: f64 = 4.0;
const LINE_TOLERANCE_HEIGHT_RATIO: f64 = 0.6;
const WORD_GAP_MIN: f64 = 4.0;
const WORD_GAP_HEIGHT_RATIO: f64 = 0.45;

/// One projected, non-table text detection.
#[derive(Clone, Debug, PartialEq)]
pub struct TextFragment {
    /// Position in the input `coordinates` array.
    pub index: usize,
    pub rect: PageSpaceRect,
    pub text: String,
    pub label: Option<String>,
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn line_tolerance(el_height: f64, group_height: f64) -> f64 {
    (LINE_TOLERANCE_HEIGHT_RATIO * el_height.min(group_height)).max(LINE_TOLERANCE_MIN)
}

fn word_gap_threshold(run_height: f64, next_height: f64) -> f64 {
    (WORD_GAP_HEIGHT_RATIO * run_height.min(next_height)).max(WORD_GAP_MIN)
}

struct LineGroup {
    label: Option<String>,
    avg_mid: f64,
    avg_height: f64,
    members: Vec<TextFragment>,
}

impl LineGroup {
    fn new(frag: TextFragment) -> Self {
        Self {
            label: frag.label.clone(),
            avg_mid: frag.rect.mid_y(),
            avg_height: frag.rect.height,
            members: vec![frag],
        }
    }

    fn push(&mut self, frag: TextFragment) {
        let n = self.members.len() as f64;
        self.avg_mid = (self.avg_mid * n + frag.rect.mid_y()) / (n + 1.0);
        self.avg_height = (self.avg_height * n + frag.rect.height) / (n + 1.0);
        self.members.push(frag);
    }

    /// Distance to the group's midpoint when `frag` belongs on this line.
    fn accepts(&self, frag: &TextFragment) -> Option<f64> {
        if self.label != frag.label {
            return None;
        }
        let dist = (frag.rect.mid_y() - self.avg_mid).abs();
        (dist <= line_tolerance(frag.rect.height, self.avg_height)).then_some(dist)
    }
}

struct RunAccumulator {
    text: String,
    rect: PageSpaceRect,
    indices: Vec<usize>,
    label: Option<String>,
}

impl RunAccumulator {
    fn start(frag: TextFragment) -> Self {
        Self {
            text: frag.text,
            rect: frag.rect,
            indices: vec![frag.index],
            label: frag.label,
        }
    }

    fn accepts(&self, frag: &TextFragment) -> bool {
        let gap = frag.rect.left - self.rect.right();
        gap <= word_gap_threshold(self.rect.height, frag.rect.height)
    }

    fn extend(&mut self, frag: TextFragment) {
        self.text.push(' ');
        self.text.push_str(&frag.text);
        self.rect = self.rect.union(&frag.rect);
        self.indices.push(frag.index);
    }

    fn finish(mut self) -> MergedElement {
        self.indices.sort_unstable();
        self.indices.dedup();
        MergedElement {
            text: self.text,
            merged_rect: self.rect,
            source_indices: self.indices,
            label: self.label,
        }
    }
}

fn group_lines(mut fragments: Vec<TextFragment>) -> Vec<LineGroup> {
    fragments.sort_by(|a, b| {
        a.rect
            .top
            .total_cmp(&b.rect.top)
            .then(a.rect.left.total_cmp(&b.rect.left))
            .then(a.index.cmp(&b.index))
    });

    let mut groups: Vec<LineGroup> = Vec::new();
    for frag in fragments {
        let best = groups
            .iter()
            .enumerate()
            .filter_map(|(gi, g)| g.accepts(&frag).map(|d| (gi, d)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(gi, _)| gi);
        match best {
            Some(gi) => groups[gi].push(frag),
            None => groups.push(LineGroup::new(frag)),
        }
    }
    groups
}

/// Merge text fragments into line runs.
///
/// Fragments whose text is blank after whitespace normalization, or whose
/// rectangle is not drawable, are skipped. Every other fragment index lands
/// in exactly one returned element.
pub fn merge_lines(fragments: Vec<TextFragment>) -> Vec<MergedElement> {
    let fragments: Vec<TextFragment> = fragments
        .into_iter()
        .filter(|f| f.rect.is_renderable())
        .filter_map(|mut f| {
            f.text = normalize_whitespace(&f.text);
            (!f.text.is_empty()).then_some(f)
        })
        .collect();
    let fragment_count = fragments.len();

    let mut merged = Vec::new();
    for group in group_lines(fragments) {
        let mut members = group.members;
        members.sort_by(|a, b| {
            a.rect
                .left
                .total_cmp(&b.rect.left)
                .then(a.index.cmp(&b.index))
        });

        let mut current: Option<RunAccumulator> = None;
        for frag in members {
            current = Some(match current {
                Some(mut run) if run.accepts(&frag) => {
                    run.extend(frag);
                    run
                }
                Some(run) => {
                    merged.push(run.finish());
                    RunAccumulator::start(frag)
                }
                None => RunAccumulator::start(frag),
            });
        }
        if let Some(run) = current {
            merged.push(run.finish());
        }
    }

    log::debug!(
        "Merged {} text fragments into {} runs",
        fragment_count,
        merged.len()
    );
    merged
}
