use std::collections::HashSet;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use page_recon::fonts::FaceMetrics;
use page_recon::{
    Error, PageRender, RenderOptions, TextMetrics, render_current_page, render_document,
    render_to_pdf, shared_metrics,
};

#[derive(Parser)]
#[command(version, about = "Rebuild page layout from extracted boxes, text and tables")]
struct Cli {
    /// Extraction payload (JSON with coordinates, tables and pages)
    input: PathBuf,

    /// Output PDF path (defaults to input with .pdf extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render only this page, in the payload's own numbering
    #[arg(long)]
    page: Option<i64>,

    /// Print the reconstructed layout as JSON instead of writing a PDF
    #[arg(long)]
    json: bool,

    /// Input element positions to highlight
    #[arg(long, value_delimiter = ',')]
    highlight: Vec<usize>,

    /// Measure text with this font file instead of the system fonts
    #[arg(long)]
    font: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(2);
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let doc = page_recon::input::parse(&cli.input)?;

    let custom_metrics = match &cli.font {
        Some(path) => Some(FaceMetrics::from_font_file(path).ok_or_else(|| {
            Error::InvalidInput(format!("unusable font file: {}", path.display()))
        })?),
        None => None,
    };
    let metrics: &dyn TextMetrics = match &custom_metrics {
        Some(m) => m,
        None => shared_metrics(),
    };

    let options = RenderOptions {
        highlighted: cli.highlight.iter().copied().collect::<HashSet<usize>>(),
    };
    let pages: Vec<PageRender> = match cli.page {
        Some(page) => render_current_page(&doc, page, metrics, &options)
            .into_iter()
            .collect(),
        None => render_document(&doc, metrics, &options),
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&pages)
            .map_err(|e| Error::InvalidInput(format!("cannot serialize layout: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("pdf"));
    let bytes = render_to_pdf(&pages, metrics)?;
    std::fs::write(&output, &bytes).map_err(Error::Io)?;
    println!("Wrote {} ({} pages)", output.display(), pages.len());
    Ok(())
}
