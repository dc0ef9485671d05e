use pdf_writer::{Content, Name, Str};

use crate::fit::{Alignment, FittedText};
use crate::fonts::{FontFamily, FontSpec, TextMetrics, to_winansi_bytes};
use crate::model::PageSpaceRect;

/// Baseline offset below the top of a line, as a fraction of the font size.
const ASCENDER_RATIO: f64 = 0.78;
const HIGHLIGHT_RGB: [f32; 3] = [1.0, 0.92, 0.45];

/// (resource name, base-14 font name) for every style the fitter can pick.
pub(super) const BASE14_FONTS: [(&str, &str); 8] = [
    ("F1", "Helvetica"),
    ("F2", "Helvetica-Bold"),
    ("F3", "Helvetica-Oblique"),
    ("F4", "Helvetica-BoldOblique"),
    ("F5", "Times-Roman"),
    ("F6", "Times-Bold"),
    ("F7", "Times-Italic"),
    ("F8", "Times-BoldItalic"),
];

fn resource_name(font: &FontSpec) -> &'static str {
    let base = match font.family {
        FontFamily::Sans => 0,
        FontFamily::Serif => 4,
    };
    let style = match (font.bold, font.italic) {
        (false, false) => 0,
        (true, false) => 1,
        (false, true) => 2,
        (true, true) => 3,
    };
    BASE14_FONTS[base + style].0
}

/// Maps top-left page space to PDF user space.
#[derive(Clone, Copy)]
pub(super) struct PageTransform {
    pub(super) page_height: f64,
}

impl PageTransform {
    pub(super) fn y(&self, top_left_y: f64) -> f32 {
        (self.page_height - top_left_y) as f32
    }

    /// Lower-left corner plus size, as `Content::rect` expects.
    pub(super) fn rect(&self, r: &PageSpaceRect) -> (f32, f32, f32, f32) {
        (r.left as f32, self.y(r.bottom()), r.width as f32, r.height as f32)
    }
}

pub(super) fn fill_highlight(content: &mut Content, tf: PageTransform, rect: &PageSpaceRect) {
    let (x, y, w, h) = tf.rect(rect);
    let [r, g, b] = HIGHLIGHT_RGB;
    content.save_state();
    content.set_fill_rgb(r, g, b);
    content.rect(x, y, w, h);
    content.fill_nonzero();
    content.restore_state();
}

/// Draw fitted lines inside `rect`, top-aligned.
pub(super) fn draw_fitted(
    content: &mut Content,
    tf: PageTransform,
    rect: &PageSpaceRect,
    fitted: &FittedText,
    metrics: &dyn TextMetrics,
) {
    let size = fitted.font.size;
    let font_name = resource_name(&fitted.font);
    for (i, line) in fitted.lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let x = match fitted.alignment {
            Alignment::Left => rect.left,
            Alignment::Center => {
                let line_w = metrics.measure(line, &fitted.font);
                rect.left + ((rect.width - line_w) / 2.0).max(0.0)
            }
        };
        let baseline = rect.top + i as f64 * fitted.line_height + size * ASCENDER_RATIO;
        content.begin_text();
        content.set_font(Name(font_name.as_bytes()), size as f32);
        content.next_line(x as f32, tf.y(baseline));
        content.show(Str(&to_winansi_bytes(line)));
        content.end_text();
    }
}
