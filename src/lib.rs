//! Portfolio PDF export for architecture studios.
//!
//! Project records are turned into an A4 document in one of three layouts:
//! `Full` (three projects per page with large images), `Compact` (six per
//! page with thumbnails) or `TextOnly` (a dense label/value table). Cover
//! images are fetched concurrently before pagination starts; an image that
//! cannot be fetched or embedded is replaced by a grey placeholder block and
//! never fails the export.
//!
//! ```rust,no_run
//! use archifolio_pdf::{ExportConfig, HttpFetcher, Layout, generate_portfolio_document, parse_records};
//!
//! # async fn run() -> Result<(), archifolio_pdf::Error> {
//! let records = parse_records(&std::fs::read_to_string("projects.json")?)?;
//! let config = ExportConfig::default().with_app_name("Studio");
//! let fetcher = HttpFetcher::new(config.fetch_timeout)?;
//! let outcome = generate_portfolio_document(&records, Layout::Full, &config, &fetcher).await?;
//! println!("{} pages written to {}", outcome.pages, outcome.path.display());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod fetch;
mod fonts;
mod locale;
mod model;
mod pdf;

pub use config::{ExportConfig, FooterStyle, HeaderStyle, LayoutProfile};
pub use error::{EmbedError, Error, FetchError};
pub use fetch::{HttpFetcher, ImageFetcher, decode_bitmap, decode_data_uri, normalize};
pub use locale::{DateStyle, FieldLabels, Locale, SymbolPosition};
pub use model::{
    Bitmap, BitmapData, ImageSlot, Layout, NormalizedRecord, ProjectRecord, ProjectStatus,
};
pub use pdf::{
    Field, ImageOutcome, PlaceholderReason, Placement, RenderReport, RenderedDocument, render,
};

use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Normalizing,
    Paginating,
    Finalized,
}

fn enter(phase: Phase, layout: Layout) {
    log::debug!("Export ({layout}): {phase:?}");
}

/// Result of a successful export.
#[derive(Clone, Debug)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub pages: u32,
    /// One entry per record, in input order.
    pub placements: Vec<Placement>,
}

/// Parses the JSON array of project records exported by the admin backend.
pub fn parse_records(json: &str) -> Result<Vec<ProjectRecord>, Error> {
    Ok(serde_json::from_str(json)?)
}

/// Normalizes and renders `records` without touching the filesystem.
pub async fn render_portfolio_bytes<F: ImageFetcher>(
    records: &[ProjectRecord],
    layout: Layout,
    config: &ExportConfig,
    fetcher: &F,
) -> Result<RenderedDocument, Error> {
    enter(Phase::Idle, layout);
    if records.is_empty() {
        return Err(Error::EmptySelection);
    }
    config.validate()?;

    enter(Phase::Normalizing, layout);
    let normalized = normalize(records, layout, fetcher).await;

    enter(Phase::Paginating, layout);
    let config = config.clone();
    let rendered = tokio::task::spawn_blocking(move || render(&normalized, layout, &config))
        .await
        .map_err(|e| Error::Runtime(format!("render task failed: {e}")))??;

    enter(Phase::Finalized, layout);
    Ok(rendered)
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let write_err = |source| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

/// Exports `records` with `layout` to
/// `<output_dir>/Portfolio-<app_name>-<Layout>.pdf`.
///
/// Fails fast with [`Error::EmptySelection`] when `records` is empty. Image
/// failures are absorbed; any other error leaves no file behind.
pub async fn generate_portfolio_document<F: ImageFetcher>(
    records: &[ProjectRecord],
    layout: Layout,
    config: &ExportConfig,
    fetcher: &F,
) -> Result<ExportOutcome, Error> {
    let t0 = Instant::now();
    let rendered = render_portfolio_bytes(records, layout, config, fetcher).await?;
    let t_render = t0.elapsed();

    let path = config.output_dir.join(config.file_name(layout));
    write_atomically(&path, &rendered.bytes).await?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: render={:.1}ms, write={:.1}ms, total={:.1}ms ({} records, {} pages, {} bytes)",
        t_render.as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        records.len(),
        rendered.report.pages,
        rendered.bytes.len(),
    );

    Ok(ExportOutcome {
        path,
        pages: rendered.report.pages,
        placements: rendered.report.placements,
    })
}

/// Blocking wrapper around [`generate_portfolio_document`] that runs it on
/// a private tokio runtime.
///
/// Returns [`Error::Runtime`] when called from inside a tokio runtime; async
/// callers should await [`generate_portfolio_document`] directly.
pub fn generate_portfolio_document_sync<F: ImageFetcher>(
    records: &[ProjectRecord],
    layout: Layout,
    config: &ExportConfig,
    fetcher: &F,
) -> Result<ExportOutcome, Error> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(Error::Runtime("already inside an async runtime".into()));
    }
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Runtime(e.to_string()))?
        .block_on(generate_portfolio_document(records, layout, config, fetcher))
}
