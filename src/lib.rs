//! Visual layout reconstruction from extracted document structure.
//!
//! Takes the boxes, text fragments, table grids and page sizes produced by an
//! upstream layout/OCR pipeline and derives a renderable geometry model:
//! canonical pages, page-space rectangles in a consistent unit system and
//! orientation, merged text lines with fitted font sizes, and normalized
//! tables. Every pass is a pure derivation from its inputs.

mod error;
pub mod fit;
pub mod fonts;
pub mod geometry;
pub mod input;
pub mod merge;
pub mod model;
mod pdf;
pub mod render;
pub mod table;
pub mod viewport;

pub use error::Error;
pub use fonts::{BuiltinMetrics, FontSpec, TextMetrics, shared_metrics};
pub use input::SourceDocument;
pub use render::{PageRender, RenderOptions, TableBlock, TextRun, render_current_page, render_document};

use std::path::Path;
use std::time::Instant;

/// Draw already rendered pages into PDF bytes.
pub fn render_to_pdf(pages: &[PageRender], metrics: &dyn TextMetrics) -> Result<Vec<u8>, Error> {
    pdf::render(pages, metrics)
}

pub fn reconstruct_json_to_pdf(input: &Path, output: &Path) -> Result<(), Error> {
    let t0 = Instant::now();

    let doc = input::parse(input)?;
    let t_parse = t0.elapsed();

    write_pdf(&doc, output, t0, t_parse)
}

pub fn reconstruct_json_bytes_to_pdf(input: &[u8], output: &Path) -> Result<(), Error> {
    let t0 = Instant::now();

    let doc = input::parse_bytes(input)?;
    let t_parse = t0.elapsed();

    write_pdf(&doc, output, t0, t_parse)
}

fn write_pdf(
    doc: &SourceDocument,
    output: &Path,
    t0: Instant,
    t_parse: std::time::Duration,
) -> Result<(), Error> {
    let metrics = shared_metrics();
    let pages = render_document(doc, metrics, &RenderOptions::default());
    let t_layout = t0.elapsed();

    let bytes = pdf::render(&pages, metrics)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, layout={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t_layout - t_parse).as_secs_f64() * 1000.0,
        (t_render - t_layout).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}
