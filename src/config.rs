//! Configuration types for a hosted document conversion.
//!
//! All behaviour is controlled through [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks and to diff two runs to
//! understand why their outcomes differ.
//!
//! # Design choice: builder over constructor
//! The credential, endpoint, limits, and timeouts all have sensible
//! defaults (or environment fallbacks); the builder lets callers set only
//! what they care about.
//!
//! # Credential handling
//! The API secret is never embedded in source. It comes from
//! [`ConversionConfigBuilder::secret`] or, failing that, the
//! `CONVERTAPI_SECRET` environment variable at `build()` time. The custom
//! `Debug` impl redacts it so a logged config can never leak it.

use crate::error::DocswapError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment variable consulted when no secret is set on the builder.
pub const SECRET_ENV_VAR: &str = "CONVERTAPI_SECRET";

/// Default conversion endpoint (ConvertAPI v2).
pub const DEFAULT_ENDPOINT: &str = "https://v2.convertapi.com";

/// Default upload size limit: 100 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 100 * 1024 * 1024;

/// A fixed input/output format pair, embedded in the endpoint path as
/// `/convert/{from}/to/{to}`.
///
/// The provider supports many pairs; these are the ones docswap ships
/// validation and MIME metadata for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionRoute {
    /// PDF document → Excel spreadsheet (`pdf` → `xlsx`).
    PdfToXlsx,
    /// PowerPoint presentation → PDF document (`pptx` → `pdf`).
    PptxToPdf,
}

impl ConversionRoute {
    /// Source format segment of the endpoint path.
    pub fn source_format(&self) -> &'static str {
        match self {
            ConversionRoute::PdfToXlsx => "pdf",
            ConversionRoute::PptxToPdf => "pptx",
        }
    }

    /// Target format segment of the endpoint path.
    pub fn target_format(&self) -> &'static str {
        match self {
            ConversionRoute::PdfToXlsx => "xlsx",
            ConversionRoute::PptxToPdf => "pdf",
        }
    }

    /// MIME type declared for the uploaded multipart part.
    pub fn source_mime(&self) -> &'static str {
        match self {
            ConversionRoute::PdfToXlsx => "application/pdf",
            ConversionRoute::PptxToPdf => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }

    /// MIME type of the converted output.
    pub fn output_mime(&self) -> &'static str {
        match self {
            ConversionRoute::PdfToXlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ConversionRoute::PptxToPdf => "application/pdf",
        }
    }

    /// File extensions accepted as input for this route.
    ///
    /// The pptx route takes `.pptx` only: legacy `.ppt` is a different
    /// container format the `/convert/pptx/...` endpoint does not
    /// describe, so accepting it would upload a mislabelled document.
    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            ConversionRoute::PdfToXlsx => &["pdf"],
            ConversionRoute::PptxToPdf => &["pptx"],
        }
    }

    /// Extension appended to the output file when none is requested.
    pub fn output_extension(&self) -> &'static str {
        self.target_format()
    }

    /// Human-readable name of the expected input format, for error text.
    pub fn input_kind(&self) -> &'static str {
        match self {
            ConversionRoute::PdfToXlsx => "PDF",
            ConversionRoute::PptxToPdf => "PowerPoint",
        }
    }

    /// True when `magic` (the file's first four bytes) matches the route's
    /// input format. PDF files start with `%PDF`; `.pptx` files are ZIP
    /// containers starting with `PK\x03\x04`.
    pub fn magic_matches(&self, magic: &[u8; 4]) -> bool {
        match self {
            ConversionRoute::PdfToXlsx => magic == b"%PDF",
            ConversionRoute::PptxToPdf => magic == b"PK\x03\x04",
        }
    }
}

impl fmt::Display for ConversionRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}2{}", self.source_format(), self.target_format())
    }
}

impl FromStr for ConversionRoute {
    type Err = DocswapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf2xlsx" | "pdf-to-xlsx" | "pdf/xlsx" => Ok(ConversionRoute::PdfToXlsx),
            "pptx2pdf" | "pptx-to-pdf" | "pptx/pdf" => Ok(ConversionRoute::PptxToPdf),
            other => Err(DocswapError::InvalidConfig(format!(
                "unknown route '{}' (expected 'pdf2xlsx' or 'pptx2pdf')",
                other
            ))),
        }
    }
}

/// Configuration for one hosted conversion.
///
/// Built via [`ConversionConfig::builder()`].
///
/// # Example
/// ```rust
/// use docswap::{ConversionConfig, ConversionRoute};
///
/// let config = ConversionConfig::builder()
///     .route(ConversionRoute::PptxToPdf)
///     .secret("my-api-secret")
///     .request_timeout_secs(120)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// The format pair to convert through. Default: [`ConversionRoute::PdfToXlsx`].
    pub route: ConversionRoute,

    /// Base URL of the conversion provider. Default: [`DEFAULT_ENDPOINT`].
    ///
    /// Overridable for testing against a local stub or a regional mirror.
    pub endpoint: String,

    /// API credential sent as the `Secret` query parameter.
    ///
    /// Filled from the builder or from `CONVERTAPI_SECRET` at `build()`
    /// time. Never logged; never part of `Debug` output.
    pub secret: String,

    /// Upload size limit in bytes. Default: [`DEFAULT_MAX_INPUT_BYTES`] (100 MiB).
    ///
    /// The provider rejects oversized uploads anyway, but failing locally
    /// is instant and does not burn credential quota.
    pub max_input_bytes: u64,

    /// Whole-request timeout in seconds. Default: 300.
    ///
    /// Covers upload, server-side conversion, and response download. The
    /// original behaviour this replaces waited indefinitely; a bound keeps
    /// a wedged provider from hanging the caller forever.
    pub request_timeout_secs: u64,

    /// TCP connect timeout in seconds. Default: 30.
    pub connect_timeout_secs: u64,

    /// Progress callback fired on upload start, every body chunk, and
    /// completion. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("route", &self.route)
            .field("endpoint", &self.endpoint)
            .field("secret", &"<redacted>")
            .field("max_input_bytes", &self.max_input_bytes)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn UploadProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Default)]
pub struct ConversionConfigBuilder {
    route: Option<ConversionRoute>,
    endpoint: Option<String>,
    secret: Option<String>,
    max_input_bytes: Option<u64>,
    request_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    progress_callback: Option<ProgressCallback>,
}

impl ConversionConfigBuilder {
    pub fn route(mut self, route: ConversionRoute) -> Self {
        self.route = Some(route);
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn max_input_bytes(mut self, limit: u64) -> Self {
        self.max_input_bytes = Some(limit);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = Some(secs);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Resolves the credential from the builder or `CONVERTAPI_SECRET`;
    /// missing both is [`DocswapError::CredentialMissing`].
    pub fn build(self) -> Result<ConversionConfig, DocswapError> {
        let secret = match self.secret {
            Some(s) if !s.trim().is_empty() => s,
            _ => std::env::var(SECRET_ENV_VAR)
                .ok()
                .filter(|s| !s.trim().is_empty())
                .ok_or(DocswapError::CredentialMissing)?,
        };

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(DocswapError::InvalidConfig(format!(
                "endpoint must be an HTTP(S) URL, got '{}'",
                endpoint
            )));
        }

        let max_input_bytes = self.max_input_bytes.unwrap_or(DEFAULT_MAX_INPUT_BYTES);
        if max_input_bytes == 0 {
            return Err(DocswapError::InvalidConfig(
                "upload size limit must be ≥ 1 byte".into(),
            ));
        }

        let request_timeout_secs = self.request_timeout_secs.unwrap_or(300);
        if request_timeout_secs == 0 {
            return Err(DocswapError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }

        Ok(ConversionConfig {
            route: self.route.unwrap_or(ConversionRoute::PdfToXlsx),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            secret,
            max_input_bytes,
            request_timeout_secs,
            connect_timeout_secs: self.connect_timeout_secs.unwrap_or(30),
            progress_callback: self.progress_callback,
        })
    }
}
