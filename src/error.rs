//! Error types for the docswap library.
//!
//! One enum covers the whole pipeline because every failure is fatal to
//! the single conversion attempt: there is no per-item partial success
//! the way a multi-page pipeline would have. The variants still group
//! into the three classes callers care about — input validation,
//! transport, and response shape — so a caller can match on them to
//! decide whether retrying the *same* input could ever help.
//!
//! The library never retries on its own and never surfaces a partial
//! result: a failed conversion returns `Err` and leaves nothing on disk.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docswap library.
#[derive(Debug, Error)]
pub enum DocswapError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file's extension does not match the route's input format.
    #[error("'{path}' does not look like a {expected} file (extension '{extension}')\nThe {route} route accepts: {accepted}")]
    UnsupportedExtension {
        path: PathBuf,
        route: String,
        expected: String,
        extension: String,
        accepted: String,
    },

    /// The file exists but its leading bytes are not the expected format.
    #[error("'{path}' is not a valid {expected} file\nFirst bytes: {magic:?}")]
    WrongMagic {
        path: PathBuf,
        expected: String,
        magic: [u8; 4],
    },

    /// The file exceeds the configured upload size limit.
    #[error("'{path}' is {size} bytes, which exceeds the {limit}-byte upload limit\nRaise the limit with --max-size-mib if the provider accepts larger files.")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    // ── Configuration errors ──────────────────────────────────────────────
    /// No API credential available from the builder or the environment.
    #[error("no API credential configured.\nSet CONVERTAPI_SECRET or pass one with --secret.")]
    CredentialMissing,

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Transport errors ──────────────────────────────────────────────────
    /// Could not reach the conversion endpoint at all.
    #[error("failed to connect to '{endpoint}': {reason}\nCheck your internet connection.")]
    ConnectFailed { endpoint: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("conversion request timed out after {secs}s\nIncrease --timeout for large documents.")]
    RequestTimeout { secs: u64 },

    /// The request failed in transit for some other reason.
    #[error("conversion request failed: {reason}")]
    RequestFailed { reason: String },

    /// The provider answered with a non-2xx status.
    ///
    /// `message` carries the provider's structured error message when the
    /// body parsed as one, otherwise the raw response text.
    #[error("conversion provider returned HTTP {status}: {message}")]
    ProviderRejected {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    // ── Response-shape errors ─────────────────────────────────────────────
    /// The response body was not the expected JSON document.
    #[error("unexpected response from conversion provider: {detail}")]
    MalformedResponse { detail: String },

    /// The response parsed but contained no output files.
    #[error("conversion provider returned no output files")]
    EmptyResult,

    /// An output file's payload was not valid base64.
    #[error("could not decode output file '{file_name}': {detail}")]
    PayloadDecodeFailed { file_name: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DocswapError {
    /// True when the same input could plausibly succeed on a later attempt
    /// (transient transport conditions). Validation and response-shape
    /// errors are deterministic and return false.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DocswapError::ConnectFailed { .. }
                | DocswapError::RequestTimeout { .. }
                | DocswapError::RequestFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_too_large_display() {
        let e = DocswapError::FileTooLarge {
            path: PathBuf::from("deck.pptx"),
            size: 200 * 1024 * 1024,
            limit: 100 * 1024 * 1024,
        };
        let msg = e.to_string();
        assert!(msg.contains("deck.pptx"), "got: {msg}");
        assert!(msg.contains("104857600"), "got: {msg}");
    }

    #[test]
    fn provider_rejected_display() {
        let e = DocswapError::ProviderRejected {
            status: 401,
            code: Some(4013),
            message: "User credentials are invalid.".into(),
        };
        assert!(e.to_string().contains("401"));
        assert!(e.to_string().contains("credentials"));
    }

    #[test]
    fn wrong_magic_display() {
        let e = DocswapError::WrongMagic {
            path: PathBuf::from("report.pdf"),
            expected: "PDF".into(),
            magic: *b"<htm",
        };
        assert!(e.to_string().contains("report.pdf"));
        assert!(e.to_string().contains("PDF"));
    }

    #[test]
    fn transient_classification() {
        assert!(DocswapError::RequestTimeout { secs: 300 }.is_transient());
        assert!(!DocswapError::EmptyResult.is_transient());
        assert!(!DocswapError::CredentialMissing.is_transient());
    }
}
