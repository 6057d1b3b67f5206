//! Conversion entry points.
//!
//! One conversion is one validated input, one multipart POST, one
//! decoded output. The orchestration here is deliberately linear — the
//! stages in [`crate::pipeline`] do the work, this module wires them
//! together, times them, and fires the terminal progress events.
//!
//! Cancellation is dropping the returned future: reqwest aborts the
//! in-flight request and the input buffer is freed with it. The whole
//! exchange is additionally bounded by
//! [`crate::config::ConversionConfig::request_timeout_secs`], so a
//! wedged provider cannot hang the caller indefinitely.

use crate::config::ConversionConfig;
use crate::error::DocswapError;
use crate::output::{ConversionOutput, ConversionStats, ConvertedOutput};
use crate::pipeline::input::DocumentInfo;
use crate::pipeline::{decode, input, upload};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Convert a local document through the configured hosted route.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_path` — path to the PDF or PPTX document
/// * `config`     — conversion configuration (route, credential, limits)
///
/// # Errors
/// Any validation, transport, or response-shape failure returns
/// `Err(DocswapError)` after being logged; no partial result is exposed
/// and exactly one outbound request was issued at most.
pub async fn convert(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, DocswapError> {
    let total_start = Instant::now();
    let input_path = input_path.as_ref();
    info!(
        "Starting {} conversion of {}",
        config.route,
        input_path.display()
    );

    let result = run(input_path, config, total_start).await;

    // Unified error surfacing: every failure is logged and reported to
    // the progress callback the same way, whatever stage produced it.
    if let Err(ref e) = result {
        warn!("Conversion failed: {e}");
        if let Some(ref cb) = config.progress_callback {
            cb.on_error(&e.to_string());
        }
    }
    result
}

async fn run(
    input_path: &Path,
    config: &ConversionConfig,
    total_start: Instant,
) -> Result<ConversionOutput, DocswapError> {
    // ── Step 1: Resolve and validate the input ───────────────────────────
    let document = input::resolve_document(input_path, config)?;
    let input_bytes = document.size;

    // ── Step 2: Upload and await the provider ────────────────────────────
    let exchange_start = Instant::now();
    let envelope = upload::upload(document, config).await?;
    let exchange_duration_ms = exchange_start.elapsed().as_millis() as u64;

    // ── Step 3: Decode the first output file ─────────────────────────────
    let decoded = decode::decode_first_file(envelope, config.route)?;
    let output_bytes = decoded.bytes.len() as u64;

    let stats = ConversionStats {
        input_bytes,
        output_bytes,
        exchange_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} bytes in, {} bytes out, {}ms total",
        stats.input_bytes, stats.output_bytes, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_complete(output_bytes);
    }

    Ok(ConversionOutput {
        file: ConvertedOutput {
            file_name: decoded.file_name,
            mime: decoded.mime,
            bytes: decoded.bytes,
        },
        stats,
    })
}

/// Convert a document and write the output directly to a file.
///
/// Uses atomic write (temp file + rename) so a failure never leaves a
/// partial output file.
pub async fn convert_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, DocswapError> {
    let output = convert(input_path, config).await?;
    output.write_to(output_path).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally. Do not call from within
/// an async context.
pub fn convert_sync(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, DocswapError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocswapError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(convert(input_path, config))
}

/// Validate a document and report its metadata without any network I/O.
///
/// Does not require a credential.
pub fn inspect(input_path: impl AsRef<Path>) -> Result<DocumentInfo, DocswapError> {
    input::document_info(input_path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionRoute;
    use std::io::Write;
    use tempfile::TempDir;

    #[tokio::test]
    async fn validation_failure_happens_before_any_network() {
        // An endpoint that cannot resolve: if validation were skipped the
        // error would be ConnectFailed, not UnsupportedExtension.
        let config = ConversionConfig::builder()
            .route(ConversionRoute::PdfToXlsx)
            .secret("test-secret")
            .endpoint("https://conversion.invalid")
            .build()
            .unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"plain text")
            .unwrap();

        let err = convert(&path, &config).await.unwrap_err();
        assert!(matches!(err, DocswapError::UnsupportedExtension { .. }));
    }

    #[test]
    fn inspect_needs_no_credential() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.5")
            .unwrap();

        let info = inspect(&path).unwrap();
        assert_eq!(info.name, "report.pdf");
        assert_eq!(info.compatible_routes, vec![ConversionRoute::PdfToXlsx]);
    }
}
