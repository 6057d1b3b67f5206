//! Input resolution: validate a user-supplied document and load its bytes.
//!
//! ## Why validate locally at all?
//!
//! The provider rejects wrong-format and oversized uploads anyway, but a
//! local check fails in microseconds instead of after a full upload, and
//! it does not burn credential quota. Extension, magic bytes, and size
//! are all checked **before** the payload is read, so an oversized file
//! never gets loaded into memory. Both routes get the same policy.

use crate::config::{ConversionConfig, ConversionRoute};
use crate::error::DocswapError;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A validated input document, loaded into memory and ready to upload.
///
/// Dropping the value frees the payload; nothing else holds a reference
/// to the bytes once the request body has consumed them.
#[derive(Debug, Clone)]
pub struct SelectedDocument {
    /// Original path the document was read from.
    pub path: PathBuf,
    /// File name sent as the multipart part's filename.
    pub name: String,
    /// Payload size in bytes.
    pub size: u64,
    /// MIME type declared for the upload (the route's source MIME).
    pub mime: &'static str,
    /// The document bytes.
    pub bytes: Vec<u8>,
}

/// Validation-only metadata about a document, produced by
/// [`crate::inspect`] without any network I/O.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    /// File name component of the path.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// First four bytes of the file.
    pub magic: [u8; 4],
    /// Routes whose input format matches the file's magic bytes.
    pub compatible_routes: Vec<ConversionRoute>,
}

/// Resolve and validate `path` for `config.route`, loading the payload.
///
/// Checks, in order: existence, readability, extension, size limit,
/// magic bytes. The first failure wins; nothing is uploaded and no state
/// changes on failure.
pub fn resolve_document(
    path: &Path,
    config: &ConversionConfig,
) -> Result<SelectedDocument, DocswapError> {
    let route = config.route;

    let meta = std::fs::metadata(path).map_err(|e| io_error(path, e))?;
    if !meta.is_file() {
        return Err(DocswapError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !route.accepted_extensions().contains(&extension.as_str()) {
        return Err(DocswapError::UnsupportedExtension {
            path: path.to_path_buf(),
            route: route.to_string(),
            expected: route.input_kind().to_string(),
            extension,
            accepted: route
                .accepted_extensions()
                .iter()
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    // Size check before the read, so an oversized file is never loaded.
    if meta.len() > config.max_input_bytes {
        return Err(DocswapError::FileTooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            limit: config.max_input_bytes,
        });
    }

    let magic = read_magic(path)?;
    if !route.magic_matches(&magic) {
        return Err(DocswapError::WrongMagic {
            path: path.to_path_buf(),
            expected: route.input_kind().to_string(),
            magic,
        });
    }

    let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    debug!(
        "Resolved {} input: {} ({} bytes)",
        route.input_kind(),
        name,
        bytes.len()
    );

    Ok(SelectedDocument {
        path: path.to_path_buf(),
        name,
        size: meta.len(),
        mime: route.source_mime(),
        bytes,
    })
}

/// Gather validation metadata about `path` without loading the payload.
pub fn document_info(path: &Path) -> Result<DocumentInfo, DocswapError> {
    let meta = std::fs::metadata(path).map_err(|e| io_error(path, e))?;
    if !meta.is_file() {
        return Err(DocswapError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let magic = read_magic(path)?;

    let compatible_routes = [ConversionRoute::PdfToXlsx, ConversionRoute::PptxToPdf]
        .into_iter()
        .filter(|r| r.magic_matches(&magic))
        .collect();

    Ok(DocumentInfo {
        name: path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string(),
        size: meta.len(),
        magic,
        compatible_routes,
    })
}

/// Read the file's first four bytes. A file shorter than four bytes
/// cannot be any supported format; the missing tail reads as zeros.
fn read_magic(path: &Path) -> Result<[u8; 4], DocswapError> {
    let mut f = std::fs::File::open(path).map_err(|e| io_error(path, e))?;
    let mut magic = [0u8; 4];
    let mut filled = 0;
    while filled < 4 {
        match f.read(&mut magic[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) => return Err(io_error(path, e)),
        }
    }
    Ok(magic)
}

fn io_error(path: &Path, e: std::io::Error) -> DocswapError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        DocswapError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        DocswapError::FileNotFound {
            path: path.to_path_buf(),
        }
    }
}
