//! Decode: provider JSON envelope → raw output bytes.
//!
//! The provider answers `{Files: [{FileName, FileExt, FileSize,
//! FileData}]}` with `FileData` holding the converted document as
//! standard base64. Only the first entry is used — the routes docswap
//! ships produce a single output document; any extra entries are logged
//! at debug level and dropped.

use crate::config::ConversionRoute;
use crate::error::DocswapError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use tracing::debug;

/// The provider's response envelope.
#[derive(Debug, Deserialize)]
pub struct ConvertEnvelope {
    #[serde(rename = "Files", default)]
    pub files: Vec<ConvertedFileEntry>,
}

/// One output file inside the envelope.
#[derive(Debug, Deserialize)]
pub struct ConvertedFileEntry {
    #[serde(rename = "FileName", default)]
    pub file_name: String,
    #[serde(rename = "FileExt", default)]
    pub file_ext: Option<String>,
    #[serde(rename = "FileSize", default)]
    pub file_size: Option<u64>,
    /// Base64-encoded converted document.
    #[serde(rename = "FileData", default)]
    pub file_data: String,
}

/// A decoded output document.
#[derive(Debug, Clone)]
pub struct DecodedOutput {
    /// Suggested file name, sanitised to a bare file name.
    pub file_name: String,
    /// MIME type of the payload (the route's output MIME).
    pub mime: &'static str,
    /// The converted document bytes.
    pub bytes: Vec<u8>,
}

/// Decode the first file of `envelope` for `route`.
pub fn decode_first_file(
    envelope: ConvertEnvelope,
    route: ConversionRoute,
) -> Result<DecodedOutput, DocswapError> {
    if envelope.files.len() > 1 {
        debug!(
            "Provider returned {} output files; keeping the first",
            envelope.files.len()
        );
    }
    let entry = envelope.files.into_iter().next().ok_or(DocswapError::EmptyResult)?;

    let file_name = sanitize_file_name(&entry.file_name, route);

    let bytes = STANDARD
        .decode(entry.file_data.trim())
        .map_err(|e| DocswapError::PayloadDecodeFailed {
            file_name: file_name.clone(),
            detail: format!("invalid base64 payload: {e}"),
        })?;

    if let Some(declared) = entry.file_size {
        if declared != bytes.len() as u64 {
            debug!(
                "Declared FileSize {} differs from decoded length {}",
                declared,
                bytes.len()
            );
        }
    }

    debug!("Decoded output '{}' ({} bytes)", file_name, bytes.len());

    Ok(DecodedOutput {
        file_name,
        mime: route.output_mime(),
        bytes,
    })
}

/// Reduce a provider-suggested name to a safe bare file name.
///
/// The suggestion goes straight into a local path, so path separators
/// and traversal components must not survive. An empty or unusable
/// suggestion falls back to `converted.{ext}` for the route.
pub fn sanitize_file_name(suggested: &str, route: ConversionRoute) -> String {
    let base = suggested
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('.');

    if base.is_empty() {
        return format!("converted.{}", route.output_extension());
    }
    base.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: &str) -> ConvertEnvelope {
        serde_json::from_str(json).expect("test envelope should parse")
    }

    #[test]
    fn decodes_well_formed_response() {
        // base64("ABC") == "QUJD"
        let env = envelope(r#"{"Files":[{"FileName":"out.pdf","FileData":"QUJD"}]}"#);
        let out = decode_first_file(env, ConversionRoute::PptxToPdf).unwrap();
        assert_eq!(out.bytes, b"ABC");
        assert_eq!(out.file_name, "out.pdf");
        assert_eq!(out.mime, "application/pdf");
    }

    #[test]
    fn xlsx_route_tags_spreadsheet_mime() {
        let env = envelope(r#"{"Files":[{"FileName":"report.xlsx","FileData":"QUJD"}]}"#);
        let out = decode_first_file(env, ConversionRoute::PdfToXlsx).unwrap();
        assert_eq!(
            out.mime,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }

    #[test]
    fn first_of_many_files_wins() {
        let env = envelope(
            r#"{"Files":[
                {"FileName":"a.pdf","FileData":"QQ=="},
                {"FileName":"b.pdf","FileData":"Qg=="}
            ]}"#,
        );
        let out = decode_first_file(env, ConversionRoute::PptxToPdf).unwrap();
        assert_eq!(out.bytes, b"A");
        assert_eq!(out.file_name, "a.pdf");
    }

    #[test]
    fn missing_files_array_is_empty_result() {
        let env = envelope(r#"{}"#);
        let err = decode_first_file(env, ConversionRoute::PdfToXlsx).unwrap_err();
        assert!(matches!(err, DocswapError::EmptyResult));
    }

    #[test]
    fn empty_files_array_is_empty_result() {
        let env = envelope(r#"{"Files":[]}"#);
        let err = decode_first_file(env, ConversionRoute::PdfToXlsx).unwrap_err();
        assert!(matches!(err, DocswapError::EmptyResult));
    }

    #[test]
    fn bad_base64_is_decode_failure() {
        let env = envelope(r#"{"Files":[{"FileName":"out.pdf","FileData":"not base64!!!"}]}"#);
        let err = decode_first_file(env, ConversionRoute::PptxToPdf).unwrap_err();
        assert!(matches!(err, DocswapError::PayloadDecodeFailed { .. }));
    }

    #[test]
    fn declared_size_mismatch_is_tolerated() {
        let env = envelope(r#"{"Files":[{"FileName":"out.pdf","FileSize":999,"FileData":"QUJD"}]}"#);
        let out = decode_first_file(env, ConversionRoute::PptxToPdf).unwrap();
        assert_eq!(out.bytes.len(), 3);
    }

    #[test]
    fn sanitize_strips_path_components() {
        let r = ConversionRoute::PptxToPdf;
        assert_eq!(sanitize_file_name("out.pdf", r), "out.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd", r), "passwd");
        assert_eq!(sanitize_file_name("C:\\tmp\\out.pdf", r), "out.pdf");
        assert_eq!(sanitize_file_name("", r), "converted.pdf");
        assert_eq!(sanitize_file_name("..", r), "converted.pdf");
        assert_eq!(
            sanitize_file_name("dir/", ConversionRoute::PdfToXlsx),
            "converted.xlsx"
        );
    }
}
