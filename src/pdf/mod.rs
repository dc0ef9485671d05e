mod layout;
mod table;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};

use crate::error::Error;
use crate::fonts::TextMetrics;
use crate::render::PageRender;

use layout::{BASE14_FONTS, PageTransform, draw_fitted, fill_highlight};
use table::render_table;

/// Draw reconstructed pages into a PDF: one PDF page per rendered page, text
/// runs at their fitted sizes and tables as grids.
pub fn render(pages: &[PageRender], metrics: &dyn TextMetrics) -> Result<Vec<u8>, Error> {
    if pages.is_empty() {
        return Err(Error::Pdf("no pages to render".into()));
    }
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let font_refs: Vec<(&str, Ref)> = BASE14_FONTS
        .iter()
        .map(|(pdf_name, base_font)| {
            let font_ref = alloc();
            pdf.type1_font(font_ref)
                .base_font(Name(base_font.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            (*pdf_name, font_ref)
        })
        .collect();

    let page_ids: Vec<Ref> = pages.iter().map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = pages.iter().map(|_| alloc()).collect();

    for (i, page) in pages.iter().enumerate() {
        let tf = PageTransform {
            page_height: page.page.height,
        };
        let mut content = Content::new();

        for table in &page.tables {
            render_table(&mut content, tf, table, metrics);
        }
        for run in &page.text_runs {
            if run.highlighted {
                fill_highlight(&mut content, tf, &run.rect);
            }
            draw_fitted(&mut content, tf, &run.rect, &run.fitted, metrics);
        }

        log::debug!(
            "PDF page {}: {} text runs, {} tables",
            page.page.page_no,
            page.text_runs.len(),
            page.tables.len()
        );

        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(pages.len() as i32);

    for (i, page) in pages.iter().enumerate() {
        let mut pdf_page = pdf.page(page_ids[i]);
        pdf_page
            .media_box(Rect::new(
                0.0,
                0.0,
                page.page.width as f32,
                page.page.height as f32,
            ))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = pdf_page.resources();
        let mut fonts = resources.fonts();
        for (name, font_ref) in &font_refs {
            fonts.pair(Name(name.as_bytes()), *font_ref);
        }
    }

    log::info!(
        "PDF export: {} pages in {:.1}ms",
        pages.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );

    Ok(pdf.finish())
}
