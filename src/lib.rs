//! # docswap
//!
//! Convert office documents through a hosted conversion API.
//!
//! ## Why this crate?
//!
//! High-fidelity office format conversion (PDF → Excel, PowerPoint →
//! PDF) needs a full layout engine; maintaining one is a product, not a
//! dependency. Instead this crate delegates the conversion itself to a
//! hosted provider (ConvertAPI-compatible wire format) and owns
//! everything around the single HTTPS exchange: input validation, the
//! multipart upload with live progress, response decoding, and atomic
//! output placement.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Input   validate extension, magic bytes, size; load payload
//!  ├─ 2. Upload  one multipart POST, 64 KiB chunks, progress events
//!  ├─ 3. Decode  JSON envelope → base64 → output bytes
//!  └─ 4. Output  atomic write + run statistics
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docswap::{convert_to_file, ConversionConfig, ConversionRoute};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read from CONVERTAPI_SECRET
//!     let config = ConversionConfig::builder()
//!         .route(ConversionRoute::PptxToPdf)
//!         .build()?;
//!     let stats = convert_to_file("deck.pptx", "deck.pdf", &config).await?;
//!     eprintln!("{} bytes in / {} bytes out", stats.input_bytes, stats.output_bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docswap` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! docswap = { version = "0.3", default-features = false }
//! ```
//!
//! ## Guarantees
//!
//! Exactly one outbound request per [`convert`] call; no retries; no
//! partial results. Upload progress is monotonic within an attempt and
//! covers the upload leg only — the server-side phase has no progress
//! signal, so consumers should show an indeterminate state between 100 %
//! uploaded and completion. The API credential is injected via
//! configuration or `CONVERTAPI_SECRET` and never appears in logs or
//! `Debug` output.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ConversionRoute};
pub use convert::{convert, convert_sync, convert_to_file, inspect};
pub use error::DocswapError;
pub use output::{ConversionOutput, ConversionStats, ConvertedOutput};
pub use pipeline::input::{DocumentInfo, SelectedDocument};
pub use progress::{NoopProgressCallback, ProgressCallback, UploadProgressCallback};
