//! One render pass: raw inputs to the per-page renderable element list.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::fit::{FittedText, fit_text};
use crate::fonts::TextMetrics;
use crate::geometry::LayoutPass;
use crate::geometry::pages::normalize_pages;
use crate::geometry::scale::CoordinateUnits;
use crate::input::SourceDocument;
use crate::merge::{TextFragment, merge_lines};
use crate::model::{PageMeta, PageSpaceRect, Rotation, TableModel};
use crate::table::{NO_DATA, extract_table};

#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
    /// Input positions to draw highlighted (citation evidence and the like).
    pub highlighted: HashSet<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextRun {
    pub rect: PageSpaceRect,
    pub text: String,
    pub label: Option<String>,
    pub fitted: FittedText,
    pub highlighted: bool,
    pub source_indices: Vec<usize>,
}

impl TextRun {
    /// Input position reported when this run is clicked.
    pub fn click_target(&self) -> Option<usize> {
        self.source_indices.first().copied()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableBlock {
    pub rect: PageSpaceRect,
    /// Position of the table element in the input `coordinates` array.
    pub element_index: usize,
    pub table_index: Option<usize>,
    pub model: TableModel,
    pub highlighted: bool,
}

impl TableBlock {
    /// Text to draw instead of a grid, when there is nothing to show.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.model.is_empty().then_some(NO_DATA)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageRender {
    pub page: PageMeta,
    /// Rotation applied to every element of the page.
    pub rotation: Rotation,
    pub units: CoordinateUnits,
    pub text_runs: Vec<TextRun>,
    pub tables: Vec<TableBlock>,
}

impl PageRender {
    /// Resolve a click at page-space `(x, y)` to the input position it
    /// refers to. Text runs are checked before tables.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        self.text_runs
            .iter()
            .filter(|r| r.rect.contains(x, y))
            .find_map(TextRun::click_target)
            .or_else(|| {
                self.tables
                    .iter()
                    .find(|t| t.rect.contains(x, y))
                    .map(|t| t.element_index)
            })
    }
}

fn table_model(tables: &[Value], table_index: Option<usize>) -> TableModel {
    match table_index.and_then(|i| tables.get(i)) {
        Some(payload) => extract_table(payload),
        None => {
            log::debug!("Table element without a payload (index {table_index:?})");
            TableModel {
                col_count: 1,
                ..TableModel::default()
            }
        }
    }
}

/// Render one page of an already set up pass.
pub fn render_page(
    pass: &mut LayoutPass<'_>,
    tables: &[Value],
    page_no: i64,
    metrics: &dyn TextMetrics,
    options: &RenderOptions,
) -> Option<PageRender> {
    let frame = pass.frame(page_no)?;

    let mut fragments = Vec::new();
    let mut table_blocks = Vec::new();
    let mut dropped = 0usize;
    let on_page: Vec<usize> = pass.elements_on(page_no).map(|(i, _)| i).collect();

    for index in on_page {
        let el = &pass.elements()[index];
        let Some(rect) = pass.project(index) else {
            dropped += 1;
            continue;
        };
        if el.is_table_element() {
            table_blocks.push(TableBlock {
                rect,
                element_index: index,
                table_index: el.table_index,
                model: table_model(tables, el.table_index),
                highlighted: options.highlighted.contains(&index),
            });
            continue;
        }
        fragments.push(TextFragment {
            index,
            rect,
            text: el.display_text().to_string(),
            label: el.label.clone(),
        });
    }

    let text_runs: Vec<TextRun> = merge_lines(fragments)
        .into_iter()
        .map(|m| {
            let fitted = fit_text(
                metrics,
                m.merged_rect.width,
                m.merged_rect.height,
                &m.text,
                m.label.as_deref(),
            );
            TextRun {
                rect: m.merged_rect,
                highlighted: m.source_indices.iter().any(|i| options.highlighted.contains(i)),
                text: m.text,
                label: m.label,
                fitted,
                source_indices: m.source_indices,
            }
        })
        .collect();

    if dropped > 0 {
        log::debug!("Page {page_no}: dropped {dropped} elements with unusable geometry");
    }

    Some(PageRender {
        page: frame.meta,
        rotation: frame.rotation,
        units: frame.scale.units,
        text_runs,
        tables: table_blocks,
    })
}

/// Render only the page the viewer is on. `current_page` is in the input's
/// own page numbering and clamps to the nearest page.
pub fn render_current_page(
    doc: &SourceDocument,
    current_page: i64,
    metrics: &dyn TextMetrics,
    options: &RenderOptions,
) -> Option<PageRender> {
    let pages = normalize_pages(&doc.pages, &doc.coordinates);
    let mut pass = LayoutPass::new(&doc.coordinates, &pages, current_page);
    let page_no = crate::geometry::nearest_page(&pages, current_page)?;
    render_page(&mut pass, &doc.tables, page_no, metrics, options)
}

/// Render every page. Elements without a page reference land on the first page.
pub fn render_document(
    doc: &SourceDocument,
    metrics: &dyn TextMetrics,
    options: &RenderOptions,
) -> Vec<PageRender> {
    let t0 = std::time::Instant::now();
    let pages = normalize_pages(&doc.pages, &doc.coordinates);
    let first = pages.first().map_or(1, |p| p.page_no);
    let mut pass = LayoutPass::new(&doc.coordinates, &pages, first);
    let rendered: Vec<PageRender> = pages
        .iter()
        .filter_map(|p| render_page(&mut pass, &doc.tables, p.page_no, metrics, options))
        .collect();
    log::info!(
        "Rendered {} pages ({} text runs, {} tables) in {:.1}ms",
        rendered.len(),
        rendered.iter().map(|p| p.text_runs.len()).sum::<usize>(),
        rendered.iter().map(|p| p.tables.len()).sum::<usize>(),
        t0.elapsed().as_secs_f64() * 1000.0
    );
    rendered
}
