use pdf_writer::Content;

use crate::fit::fit_text;
use crate::fonts::TextMetrics;
use crate::model::PageSpaceRect;
use crate::render::TableBlock;

use super::layout::{PageTransform, draw_fitted, fill_highlight};

const CELL_PADDING: f64 = 1.5;
const GRID_LINE_WIDTH: f32 = 0.5;
const GRID_GRAY: f32 = 0.55;

fn stroke_line(content: &mut Content, x1: f32, y1: f32, x2: f32, y2: f32) {
    content.move_to(x1, y1);
    content.line_to(x2, y2);
    content.stroke();
}

/// Draw a table as an evenly divided grid over its rectangle. Header cells
/// use the section-header style.
pub(super) fn render_table(
    content: &mut Content,
    tf: PageTransform,
    table: &TableBlock,
    metrics: &dyn TextMetrics,
) {
    let rect = &table.rect;
    if table.highlighted {
        fill_highlight(content, tf, rect);
    }

    content.save_state();
    content.set_line_width(GRID_LINE_WIDTH);
    content.set_stroke_gray(GRID_GRAY);
    let (x, y, w, h) = tf.rect(rect);
    content.rect(x, y, w, h);
    content.stroke();
    content.restore_state();

    if let Some(placeholder) = table.placeholder() {
        let fitted = fit_text(metrics, rect.width, rect.height, placeholder, Some("caption"));
        draw_fitted(content, tf, rect, &fitted, metrics);
        return;
    }

    let model = &table.model;
    let header_rows = usize::from(!model.headers.is_empty());
    let n_rows = header_rows + model.rows.len();
    if n_rows == 0 {
        return;
    }
    let cell_w = rect.width / model.col_count as f64;
    let cell_h = rect.height / n_rows as f64;

    content.save_state();
    content.set_line_width(GRID_LINE_WIDTH);
    content.set_stroke_gray(GRID_GRAY);
    for r in 1..n_rows {
        let y = tf.y(rect.top + r as f64 * cell_h);
        stroke_line(content, rect.left as f32, y, rect.right() as f32, y);
    }
    for c in 1..model.col_count {
        let x = (rect.left + c as f64 * cell_w) as f32;
        stroke_line(content, x, tf.y(rect.top), x, tf.y(rect.bottom()));
    }
    content.restore_state();

    let all_rows = std::iter::once(&model.headers)
        .take(header_rows)
        .chain(model.rows.iter());
    for (ri, row) in all_rows.enumerate() {
        let label = (ri < header_rows).then_some("section_header");
        for (ci, cell) in row.iter().enumerate() {
            if cell.trim().is_empty() {
                continue;
            }
            let cell_rect = PageSpaceRect::new(
                rect.left + ci as f64 * cell_w + CELL_PADDING,
                rect.top + ri as f64 * cell_h + CELL_PADDING,
                cell_w - 2.0 * CELL_PADDING,
                cell_h - 2.0 * CELL_PADDING,
            );
            if !cell_rect.is_renderable() {
                continue;
            }
            let fitted = fit_text(metrics, cell_rect.width, cell_rect.height, cell, label);
            draw_fitted(content, tf, &cell_rect, &fitted, metrics);
        }
    }
}
