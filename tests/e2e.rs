//! End-to-end integration tests for docswap.
//!
//! The live tests upload real documents to the conversion provider and
//! therefore need a credential and quota. They are gated behind the
//! `E2E_ENABLED` environment variable (plus `CONVERTAPI_SECRET`) so they
//! do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 CONVERTAPI_SECRET=... cargo test --test e2e -- --nocapture
//!
//! Everything else in this file runs offline.

use docswap::{
    convert, convert_to_file, inspect, ConversionConfig, ConversionRoute, DocswapError,
    UploadProgressCallback,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A minimal but structurally valid single-page PDF.
fn minimal_pdf() -> Vec<u8> {
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n");
    pdf.extend_from_slice(b"1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n");
    pdf.extend_from_slice(b"2 0 obj<</Type/Pages/Kids[3 0 R]/Count 1>>endobj\n");
    pdf.extend_from_slice(b"3 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]>>endobj\n");
    pdf.extend_from_slice(b"trailer<</Root 1 0 R>>\n%%EOF\n");
    pdf
}

fn write_temp(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(bytes).unwrap();
    path
}

fn offline_config(route: ConversionRoute) -> ConversionConfig {
    ConversionConfig::builder()
        .route(route)
        .secret("offline-test-secret")
        // Discard port; connections are refused immediately, so a test
        // that accidentally reaches the network fails fast and loudly.
        .endpoint("http://127.0.0.1:9")
        .request_timeout_secs(5)
        .connect_timeout_secs(2)
        .build()
        .unwrap()
}

/// Skip a live test unless E2E_ENABLED and a credential are both set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run live e2e tests");
            return;
        }
        match std::env::var("CONVERTAPI_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                println!("SKIP — set CONVERTAPI_SECRET to run live e2e tests");
                return;
            }
        }
    }};
}

// ── Offline: validation through the public API ───────────────────────────────

#[tokio::test]
async fn wrong_extension_never_reaches_the_network() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "notes.txt", b"plain text");

    let err = convert(&path, &offline_config(ConversionRoute::PdfToXlsx))
        .await
        .unwrap_err();
    assert!(
        matches!(err, DocswapError::UnsupportedExtension { .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn oversized_document_never_reaches_the_network() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "big.pdf", &minimal_pdf());

    let config = ConversionConfig::builder()
        .route(ConversionRoute::PdfToXlsx)
        .secret("offline-test-secret")
        .endpoint("http://127.0.0.1:9")
        .max_input_bytes(16)
        .build()
        .unwrap();

    let err = convert(&path, &config).await.unwrap_err();
    assert!(matches!(err, DocswapError::FileTooLarge { .. }), "got: {err:?}");
}

#[tokio::test]
async fn mislabelled_pptx_is_rejected() {
    let dir = TempDir::new().unwrap();
    // A PDF renamed to .pptx: extension passes, magic bytes don't.
    let path = write_temp(&dir, "deck.pptx", &minimal_pdf());

    let err = convert(&path, &offline_config(ConversionRoute::PptxToPdf))
        .await
        .unwrap_err();
    assert!(matches!(err, DocswapError::WrongMagic { .. }), "got: {err:?}");
}

// ── Offline: transport failures surface as typed errors ─────────────────────

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "report.pdf", &minimal_pdf());

    let err = convert(&path, &offline_config(ConversionRoute::PdfToXlsx))
        .await
        .unwrap_err();
    assert!(err.is_transient(), "expected a transport error, got: {err:?}");
}

#[tokio::test]
async fn failed_conversion_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "report.pdf", &minimal_pdf());
    let out = dir.path().join("report.xlsx");

    let result = convert_to_file(&path, &out, &offline_config(ConversionRoute::PdfToXlsx)).await;

    assert!(result.is_err());
    assert!(!out.exists(), "failed conversion must not leave an output file");
}

// ── Offline: wire format against a local capture server ─────────────────────

/// Accepts HTTP requests on a loopback port, records each raw request, and
/// replies with a canned conversion envelope.
struct CaptureServer {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl CaptureServer {
    fn start(response_body: &'static str) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let raw = read_http_request(&mut stream);
                recorded.lock().unwrap().push(raw);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response_body.len(),
                    response_body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        CaptureServer { addr, requests }
    }

    fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Reads one full HTTP request: the head, then the body per its framing
/// (Content-Length, or chunked up to the terminating zero-size chunk).
fn read_http_request(stream: &mut std::net::TcpStream) -> Vec<u8> {
    use std::io::Read;
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            return raw;
        }
        raw.extend_from_slice(&buf[..n]);
        let Some(head_end) = find_subslice(&raw, b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&raw[..head_end]).to_ascii_lowercase();
        let body = &raw[head_end + 4..];
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok());
        match content_length {
            Some(len) if body.len() >= len => return raw,
            None if find_subslice(body, b"0\r\n\r\n").is_some() => return raw,
            _ => {}
        }
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[tokio::test]
async fn upload_is_a_single_multipart_post_carrying_the_document() {
    let server =
        CaptureServer::start(r#"{"Files":[{"FileName":"report.xlsx","FileData":"QUJD"}]}"#);

    let dir = TempDir::new().unwrap();
    let payload = minimal_pdf();
    let path = write_temp(&dir, "report.pdf", &payload);

    let config = ConversionConfig::builder()
        .route(ConversionRoute::PdfToXlsx)
        .secret("offline-test-secret")
        .endpoint(server.endpoint())
        .build()
        .unwrap();

    let output = convert(&path, &config).await.unwrap();
    assert_eq!(output.file.bytes, b"ABC");
    assert_eq!(output.file.file_name, "report.xlsx");

    let requests = server.requests.lock().unwrap();
    assert_eq!(requests.len(), 1, "one conversion must mean one request");
    let raw = &requests[0];

    let head_end = find_subslice(raw, b"\r\n\r\n").unwrap();
    let head = String::from_utf8_lossy(&raw[..head_end]);
    assert!(
        head.starts_with("POST /convert/pdf/to/xlsx?Secret=offline-test-secret"),
        "unexpected request line: {:?}",
        head.lines().next().unwrap_or("")
    );
    assert!(
        head.to_ascii_lowercase().contains("content-type: multipart/form-data"),
        "upload must be multipart/form-data"
    );

    let body = &raw[head_end + 4..];
    assert!(find_subslice(body, b"name=\"File\"").is_some());
    assert!(find_subslice(body, b"filename=\"report.pdf\"").is_some());
    assert!(
        find_subslice(body, &payload).is_some(),
        "multipart body must carry the document bytes verbatim"
    );
}

// ── Offline: progress and inspect ────────────────────────────────────────────

struct PercentRecorder {
    seen: Mutex<Vec<u8>>,
    errors: AtomicU8,
}

impl UploadProgressCallback for PercentRecorder {
    fn on_upload_progress(&self, _sent: u64, _total: u64, percent: u8) {
        self.seen.lock().unwrap().push(percent);
    }
    fn on_error(&self, _error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn progress_callback_hears_about_failures() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "report.pdf", &minimal_pdf());

    let recorder = Arc::new(PercentRecorder {
        seen: Mutex::new(Vec::new()),
        errors: AtomicU8::new(0),
    });

    let config = ConversionConfig::builder()
        .route(ConversionRoute::PdfToXlsx)
        .secret("offline-test-secret")
        .endpoint("http://127.0.0.1:9")
        .request_timeout_secs(5)
        .connect_timeout_secs(2)
        .progress_callback(Arc::clone(&recorder) as Arc<dyn UploadProgressCallback>)
        .build()
        .unwrap();

    let _ = convert(&path, &config).await;

    assert_eq!(recorder.errors.load(Ordering::SeqCst), 1);
    let seen = recorder.seen.lock().unwrap();
    assert!(
        seen.windows(2).all(|w| w[0] <= w[1]),
        "percentages must never decrease: {seen:?}"
    );
}

#[test]
fn inspect_classifies_both_formats() {
    let dir = TempDir::new().unwrap();

    let pdf = write_temp(&dir, "report.pdf", &minimal_pdf());
    let info = inspect(&pdf).unwrap();
    assert_eq!(info.compatible_routes, vec![ConversionRoute::PdfToXlsx]);

    let pptx = write_temp(&dir, "deck.pptx", b"PK\x03\x04 rest of zip");
    let info = inspect(&pptx).unwrap();
    assert_eq!(info.compatible_routes, vec![ConversionRoute::PptxToPdf]);

    let junk = write_temp(&dir, "junk.bin", b"\x00\x01\x02\x03");
    let info = inspect(&junk).unwrap();
    assert!(info.compatible_routes.is_empty());
}

#[test]
fn inspect_missing_file_errors() {
    let dir = TempDir::new().unwrap();
    let err = inspect(dir.path().join("absent.pdf")).unwrap_err();
    assert!(matches!(err, DocswapError::FileNotFound { .. }));
}

// ── Live tests (credential + quota required) ─────────────────────────────────

#[tokio::test]
async fn live_pdf_to_xlsx_roundtrip() {
    let secret = e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "live.pdf", &minimal_pdf());

    let config = ConversionConfig::builder()
        .route(ConversionRoute::PdfToXlsx)
        .secret(secret)
        .build()
        .unwrap();

    let output = convert(&path, &config).await.expect("live conversion should succeed");

    // xlsx files are ZIP containers.
    assert!(output.file.bytes.starts_with(b"PK"), "output is not an xlsx");
    assert!(output.file.mime.contains("spreadsheetml"));
    assert!(output.stats.output_bytes > 0);
    println!(
        "live: {} bytes in, {} bytes out, {}ms",
        output.stats.input_bytes, output.stats.output_bytes, output.stats.total_duration_ms
    );
}

#[tokio::test]
async fn live_bad_secret_is_provider_rejection() {
    let _ = e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "live.pdf", &minimal_pdf());

    let config = ConversionConfig::builder()
        .route(ConversionRoute::PdfToXlsx)
        .secret("definitely-not-a-valid-secret")
        .build()
        .unwrap();

    let err = convert(&path, &config).await.unwrap_err();
    match err {
        DocswapError::ProviderRejected { status, .. } => {
            assert!(status == 401 || status == 400, "unexpected status {status}");
        }
        other => panic!("expected ProviderRejected, got {other:?}"),
    }
}
