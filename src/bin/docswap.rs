//! CLI binary for docswap.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and renders upload progress.

use anyhow::{Context, Result};
use clap::Parser;
use docswap::{
    convert, inspect, ConversionConfig, ConversionRoute, ProgressCallback,
    UploadProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a bytes bar for the upload leg, then a
/// spinner while the provider converts. The provider gives no signal for
/// its own phase, so the spinner is honestly indeterminate.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Validating document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"])
    }
}

impl UploadProgressCallback for CliProgressCallback {
    fn on_upload_start(&self, total_bytes: u64) {
        let upload_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes} ({percent:>3}%)  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total_bytes);
        self.bar.set_style(upload_style);
        self.bar.set_prefix("Uploading");
        self.bar.reset_eta();
    }

    fn on_upload_progress(&self, bytes_sent: u64, _total_bytes: u64, _percent: u8) {
        self.bar.set_position(bytes_sent);
    }

    fn on_processing(&self) {
        self.bar.set_style(Self::spinner_style());
        self.bar.set_prefix("Converting");
        self.bar.set_message("Waiting for the conversion provider…");
    }

    fn on_complete(&self, output_bytes: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Conversion complete  {}",
            green("✔"),
            dim(&format!("{output_bytes} bytes received")),
        );
    }

    fn on_error(&self, _error: &str) {
        // The anyhow chain in main() prints the details.
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # PDF to Excel, output name suggested by the provider
  docswap pdf2xlsx report.pdf

  # PowerPoint to PDF with an explicit output path
  docswap pptx2pdf deck.pptx -o deck.pdf

  # Check what a file is without uploading anything
  docswap pdf2xlsx mystery.pdf --inspect-only

  # Machine-readable run statistics
  docswap pdf2xlsx report.pdf --json -o report.xlsx

ROUTES:
  pdf2xlsx   PDF document ─▶ Excel spreadsheet (.xlsx)
  pptx2pdf   PowerPoint presentation ─▶ PDF document

ENVIRONMENT VARIABLES:
  CONVERTAPI_SECRET   API credential for the conversion provider (required)
  DOCSWAP_ENDPOINT    Override the provider base URL

SETUP:
  1. Get a credential from your conversion provider account page.
  2. export CONVERTAPI_SECRET=...
  3. docswap pptx2pdf deck.pptx

The document is uploaded over HTTPS to the provider, converted there,
and the result is downloaded and written locally. Nothing is persisted
anywhere else. Uploads are capped at 100 MiB by default (--max-size-mib).
"#;

/// Convert office documents through a hosted conversion API.
#[derive(Parser, Debug)]
#[command(
    name = "docswap",
    version,
    about = "Convert office documents through a hosted conversion API",
    long_about = "Upload a PDF or PowerPoint document to a hosted conversion provider \
(ConvertAPI-compatible) and write the converted result locally. The conversion itself \
runs on the provider's side; docswap owns validation, upload progress, and output placement.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Conversion route: pdf2xlsx or pptx2pdf.
    route: RouteArg,

    /// Local document to convert.
    input: PathBuf,

    /// Write the converted document here. Defaults to the file name the
    /// provider suggests, in the current directory.
    #[arg(short, long, env = "DOCSWAP_OUTPUT")]
    output: Option<PathBuf>,

    /// API credential. Prefer the environment variable over the flag so
    /// the secret stays out of shell history.
    #[arg(long, env = "CONVERTAPI_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Conversion provider base URL.
    #[arg(long, env = "DOCSWAP_ENDPOINT", default_value = "https://v2.convertapi.com")]
    endpoint: String,

    /// Upload size limit in MiB.
    #[arg(long, env = "DOCSWAP_MAX_SIZE_MIB", default_value_t = 100)]
    max_size_mib: u64,

    /// Whole-request timeout in seconds (upload + conversion + download).
    #[arg(long, env = "DOCSWAP_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// Print run statistics as JSON instead of the summary line.
    #[arg(long, env = "DOCSWAP_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "DOCSWAP_NO_PROGRESS")]
    no_progress: bool,

    /// Validate the document and print its metadata, no upload.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSWAP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCSWAP_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum RouteArg {
    Pdf2xlsx,
    Pptx2pdf,
}

impl From<RouteArg> for ConversionRoute {
    fn from(v: RouteArg) -> Self {
        match v {
            RouteArg::Pdf2xlsx => ConversionRoute::PdfToXlsx,
            RouteArg::Pptx2pdf => ConversionRoute::PptxToPdf,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect(&cli.input).context("Failed to inspect document")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialise metadata")?
            );
        } else {
            println!("File:    {}", cli.input.display());
            println!("Size:    {} bytes", info.size);
            println!("Magic:   {:?}", info.magic);
            if info.compatible_routes.is_empty() {
                println!("Routes:  (none — not a supported input format)");
            } else {
                let routes: Vec<String> =
                    info.compatible_routes.iter().map(|r| r.to_string()).collect();
                println!("Routes:  {}", routes.join(", "));
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn UploadProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.input, &config)
        .await
        .context("Conversion failed")?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&output.file.file_name));
    output
        .write_to(&output_path)
        .await
        .context("Failed to write the converted document")?;

    if cli.json {
        #[derive(serde::Serialize)]
        struct JsonSummary<'a> {
            output_path: &'a std::path::Path,
            file_name: &'a str,
            mime: &'a str,
            stats: &'a docswap::ConversionStats,
        }
        let summary = JsonSummary {
            output_path: &output_path,
            file_name: &output.file.file_name,
            mime: output.file.mime,
            stats: &output.stats,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} {} {}  {}",
            green("✔"),
            bold(&cli.input.display().to_string()),
            cyan("─▶"),
            bold(&output_path.display().to_string()),
            dim(&format!(
                "{} bytes, {}ms",
                output.stats.output_bytes, output.stats.total_duration_ms
            )),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let max_input_bytes = cli
        .max_size_mib
        .checked_mul(1024 * 1024)
        .with_context(|| format!("--max-size-mib {} overflows the byte limit", cli.max_size_mib))?;

    let mut builder = ConversionConfig::builder()
        .route(cli.route.into())
        .endpoint(cli.endpoint.clone())
        .max_input_bytes(max_input_bytes)
        .request_timeout_secs(cli.timeout);

    if let Some(ref secret) = cli.secret {
        builder = builder.secret(secret.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
