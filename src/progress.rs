//! Progress-callback trait for upload events.
//!
//! Inject an [`Arc<dyn UploadProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to
//! receive real-time events as the request body is handed to the
//! transport.
//!
//! # What the percentage means
//!
//! The signal covers the **upload leg only**: the provider gives no
//! progress for its server-side conversion phase or for the response
//! download. Consumers should treat 100 % as "upload done, waiting on the
//! provider" and only show completion once [`on_complete`] fires —
//! exactly the two-phase display the CLI renders.
//!
//! [`on_complete`]: UploadProgressCallback::on_complete

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Called by the conversion pipeline as the upload proceeds.
///
/// Implementations must be `Send + Sync` (the body stream is polled on
/// the runtime's worker threads). All methods have default no-op
/// implementations so callers only override what they care about.
pub trait UploadProgressCallback: Send + Sync {
    /// Called once, before the first body byte is sent.
    ///
    /// # Arguments
    /// * `total_bytes` — size of the document being uploaded
    fn on_upload_start(&self, total_bytes: u64) {
        let _ = total_bytes;
    }

    /// Called whenever a body chunk is handed to the transport.
    ///
    /// # Arguments
    /// * `bytes_sent`  — cumulative bytes handed over so far
    /// * `total_bytes` — size of the document being uploaded
    /// * `percent`     — `round(sent*100/total)`, guaranteed non-decreasing
    ///   within one conversion attempt
    fn on_upload_progress(&self, bytes_sent: u64, total_bytes: u64, percent: u8) {
        let _ = (bytes_sent, total_bytes, percent);
    }

    /// Called once the full body has been handed to the transport and the
    /// pipeline is waiting on the provider's response.
    fn on_processing(&self) {}

    /// Called when the converted output has been decoded.
    ///
    /// # Arguments
    /// * `output_bytes` — size of the decoded output payload
    fn on_complete(&self, output_bytes: u64) {
        let _ = output_bytes;
    }

    /// Called when the conversion fails at any stage.
    ///
    /// # Arguments
    /// * `error` — human-readable error description
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl UploadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn UploadProgressCallback>;

/// Percentage tracker enforcing the upload-progress invariants: values
/// stay within 0–100 and never decrease within one attempt.
///
/// A fresh gauge is created per conversion attempt, which is what resets
/// the percentage to 0 between attempts.
#[derive(Debug)]
pub struct ProgressGauge {
    total: u64,
    percent: AtomicU8,
}

impl ProgressGauge {
    /// Create a gauge for an upload of `total` bytes, starting at 0 %.
    pub fn new(total: u64) -> Self {
        Self {
            total,
            percent: AtomicU8::new(0),
        }
    }

    /// Record `sent` cumulative bytes and return the current percentage.
    ///
    /// Clamped to 100 and monotonic: a stale smaller observation never
    /// moves the gauge backwards.
    pub fn record(&self, sent: u64) -> u8 {
        let pct = if self.total == 0 {
            100
        } else {
            (((sent.min(self.total)) as u128 * 100 + (self.total as u128 / 2))
                / self.total as u128) as u8
        };
        let pct = pct.min(100);
        self.percent.fetch_max(pct, Ordering::Relaxed);
        self.percent.load(Ordering::Relaxed)
    }

    /// Current percentage, 0–100.
    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }

    /// Total bytes this gauge was created for.
    pub fn total(&self) -> u64 {
        self.total
    }
}
