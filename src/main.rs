//! Command-line front end: reads a JSON array of project records and writes
//! the portfolio PDF for the chosen layout.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use archifolio_pdf::{
    ExportConfig, FooterStyle, HeaderStyle, HttpFetcher, ImageOutcome, Layout, Locale,
    generate_portfolio_document, parse_records,
};
use clap::Parser;

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LayoutArg {
    Full,
    Compact,
    TextOnly,
}

impl From<LayoutArg> for Layout {
    fn from(v: LayoutArg) -> Self {
        match v {
            LayoutArg::Full => Layout::Full,
            LayoutArg::Compact => Layout::Compact,
            LayoutArg::TextOnly => Layout::TextOnly,
        }
    }
}

/// Export architecture project records as a paginated PDF portfolio.
#[derive(Parser, Debug)]
#[command(name = "archifolio-pdf", version, arg_required_else_help = true)]
struct Cli {
    /// JSON file holding an array of project records.
    records: PathBuf,

    #[arg(short, long, value_enum, default_value = "full")]
    layout: LayoutArg,

    /// Directory the PDF is written into.
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Name used in the file name and document title.
    #[arg(long, env = "ARCHIFOLIO_APP_NAME", default_value = "Archifolio")]
    app_name: String,

    /// Language for labels, dates and currency (it, en).
    #[arg(long, default_value = "it")]
    locale: String,

    /// Font family to embed instead of Helvetica.
    #[arg(long)]
    font: Option<String>,

    /// Replace the page number footer with this text.
    #[arg(long)]
    footer_text: Option<String>,

    /// Header label drawn on every page; `{page}` is the page number.
    #[arg(long)]
    header_label: Option<String>,

    /// Per-image fetch timeout in seconds.
    #[arg(long)]
    fetch_timeout: Option<u64>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Result<ExportConfig> {
        let locale = Locale::from_tag(&self.locale)
            .ok_or_else(|| anyhow!("unsupported locale '{}' (expected it or en)", self.locale))?;
        let mut config = ExportConfig::default()
            .with_app_name(&self.app_name)
            .with_output_dir(&self.out)
            .with_locale(locale);
        if let Some(font) = &self.font {
            config = config.with_font_family(font);
        }
        if let Some(text) = &self.footer_text {
            config = config.with_footer(FooterStyle::Text(text.clone()));
        }
        if let Some(label) = &self.header_label {
            config = config.with_header(HeaderStyle {
                label: label.clone(),
                rule_color: [119, 139, 159],
            });
        }
        if let Some(secs) = self.fetch_timeout {
            config = config.with_fetch_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let json = tokio::fs::read_to_string(&cli.records)
        .await
        .with_context(|| format!("cannot read {}", cli.records.display()))?;
    let records = parse_records(&json)
        .with_context(|| format!("cannot parse {}", cli.records.display()))?;
    let config = cli.config()?;
    config.validate()?;

    let fetcher = HttpFetcher::new(config.fetch_timeout)?;
    let outcome = generate_portfolio_document(&records, cli.layout.into(), &config, &fetcher)
        .await
        .context("export failed")?;

    let placeholders = outcome
        .placements
        .iter()
        .filter(|p| matches!(p.image, ImageOutcome::Placeholder(_)))
        .count();
    println!(
        "{} ({} pages, {} projects, {} image placeholders)",
        outcome.path.display(),
        outcome.pages,
        outcome.placements.len(),
        placeholders
    );
    Ok(())
}
