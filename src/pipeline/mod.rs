//! Pipeline stages for one hosted conversion.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap an
//! implementation (e.g. a different provider wire format) without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ upload ──▶ decode
//! (path)  (multipart)  (base64)
//! ```
//!
//! 1. [`input`]  — resolve and validate the user-supplied document
//!    (extension, magic bytes, size cap) into an in-memory payload
//! 2. [`upload`] — the only stage with network I/O: one multipart POST
//!    with a chunked body so upload progress can be observed
//! 3. [`decode`] — parse the provider's JSON envelope and base64-decode
//!    the first output file

pub mod decode;
pub mod input;
pub mod upload;
