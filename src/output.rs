//! Output types: the converted artifact and run statistics.
//!
//! The converted bytes live inside [`ConversionOutput`] and nowhere
//! else; dropping the value frees them. This scoped ownership replaces
//! the original behaviour of allocating a download reference that was
//! never released.

use crate::error::DocswapError;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// The result of one successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// The converted document.
    pub file: ConvertedOutput,
    /// Timing and size statistics for the run.
    pub stats: ConversionStats,
}

/// The converted document payload.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedOutput {
    /// Provider-suggested file name, already sanitised to a bare name.
    pub file_name: String,
    /// MIME type of the payload.
    pub mime: &'static str,
    /// The document bytes. Skipped in JSON output; `--json` reports
    /// sizes, not megabytes of base64.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Statistics for one conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionStats {
    /// Input payload size in bytes.
    pub input_bytes: u64,
    /// Decoded output size in bytes.
    pub output_bytes: u64,
    /// Wall-clock time of the HTTP exchange (upload + server-side
    /// conversion + response download).
    pub exchange_duration_ms: u64,
    /// Wall-clock time of the whole run, validation included.
    pub total_duration_ms: u64,
}

impl ConversionOutput {
    /// Write the converted bytes to `path` atomically (temp + rename),
    /// creating parent directories as needed.
    ///
    /// A failed conversion never reaches this point, and a failed write
    /// leaves no partial file at `path`.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<(), DocswapError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    DocswapError::OutputWriteFailed {
                        path: path.to_path_buf(),
                        source: e,
                    }
                })?;
            }
        }

        let tmp_path = path.with_extension("docswap.tmp");
        tokio::fs::write(&tmp_path, &self.file.bytes)
            .await
            .map_err(|e| DocswapError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| DocswapError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        info!(
            "Wrote {} bytes to {}",
            self.file.bytes.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_output() -> ConversionOutput {
        ConversionOutput {
            file: ConvertedOutput {
                file_name: "out.pdf".into(),
                mime: "application/pdf",
                bytes: b"%PDF-1.7 converted".to_vec(),
            },
            stats: ConversionStats {
                input_bytes: 10,
                output_bytes: 18,
                exchange_duration_ms: 1200,
                total_duration_ms: 1250,
            },
        }
    }

    #[tokio::test]
    async fn write_to_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("nested/deep/out.pdf");

        sample_output().write_to(&dest).await.unwrap();

        let written = std::fs::read(&dest).unwrap();
        assert_eq!(written, b"%PDF-1.7 converted");
    }

    #[tokio::test]
    async fn write_to_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.pdf");

        sample_output().write_to(&dest).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }

    #[test]
    fn json_stats_skip_the_payload() {
        let json = serde_json::to_string(&sample_output()).unwrap();
        assert!(json.contains("output_bytes"));
        assert!(!json.contains("%PDF"), "payload leaked into JSON: {json}");
    }
}
