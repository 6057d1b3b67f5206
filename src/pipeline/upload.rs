//! Upload: one multipart POST to the conversion provider.
//!
//! The only stage with network I/O. The document goes out as a single
//! multipart part named `File`, the route is embedded in the URL path
//! (`/convert/{from}/to/{to}`), and the credential rides along as the
//! `Secret` query parameter — which is why URLs are never logged with
//! their query strings.
//!
//! ## How upload progress works
//!
//! reqwest exposes no bytes-sent counter, so the body is handed over as a
//! stream of 64 KiB chunks and the counting happens as the transport
//! polls each chunk off the stream. That is the same granularity a
//! browser XHR reports and is exact for the buffer-to-socket handoff; the
//! kernel send buffer may run a little ahead of the wire, which no
//! user-space HTTP client can see anyway.

use crate::config::ConversionConfig;
use crate::error::DocswapError;
use crate::pipeline::decode::ConvertEnvelope;
use crate::pipeline::input::SelectedDocument;
use crate::progress::{ProgressCallback, ProgressGauge};
use futures::stream::{self, Stream};
use reqwest::multipart;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Multipart field name the provider expects the document under.
pub const UPLOAD_FIELD: &str = "File";

/// Body chunk size; small enough for smooth progress, large enough to
/// keep per-chunk overhead negligible.
const CHUNK_SIZE: usize = 64 * 1024;

/// Build the conversion URL for `config`, without the query string.
pub fn convert_url(config: &ConversionConfig) -> String {
    format!(
        "{}/convert/{}/to/{}",
        config.endpoint,
        config.route.source_format(),
        config.route.target_format()
    )
}

/// Upload `document` and return the provider's parsed response envelope.
///
/// Issues exactly one POST. Fires `on_upload_start`, per-chunk
/// `on_upload_progress`, and `on_processing` on the configured callback;
/// completion/error events are the orchestrator's job.
pub async fn upload(
    document: SelectedDocument,
    config: &ConversionConfig,
) -> Result<ConvertEnvelope, DocswapError> {
    let url = convert_url(config);
    let total = document.bytes.len() as u64;
    info!(
        "Uploading {} ({} bytes) to {}",
        document.name, total, url
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()
        .map_err(|e| DocswapError::Internal(format!("failed to create HTTP client: {e}")))?;

    let gauge = Arc::new(ProgressGauge::new(total));
    let cb = config.progress_callback.clone();
    if let Some(ref cb) = cb {
        cb.on_upload_start(total);
    }

    let body = reqwest::Body::wrap_stream(counting_stream(
        document.bytes,
        Arc::clone(&gauge),
        cb,
    ));
    let part = multipart::Part::stream_with_length(body, total)
        .file_name(document.name.clone())
        .mime_str(document.mime)
        .map_err(|e| DocswapError::Internal(format!("invalid part MIME: {e}")))?;
    let form = multipart::Form::new().part(UPLOAD_FIELD, part);

    let response = client
        .post(&url)
        .query(&[("Secret", config.secret.as_str())])
        .multipart(form)
        .send()
        .await
        .map_err(|e| classify_transport_error(e, config))?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error response".to_string());
        warn!("Provider rejected the request: HTTP {} — {}", status, body_text);
        return Err(provider_rejection(status.as_u16(), &body_text));
    }

    debug!("Provider answered HTTP {} — parsing response body", status);
    response
        .json::<ConvertEnvelope>()
        .await
        .map_err(|e| DocswapError::MalformedResponse {
            detail: format!("response body is not the expected JSON: {e}"),
        })
}

/// Chunk `bytes` into a body stream that counts bytes as the transport
/// polls them off, publishing each observation through the gauge and the
/// optional callback. Fires `on_processing` after the final chunk.
fn counting_stream(
    bytes: Vec<u8>,
    gauge: Arc<ProgressGauge>,
    cb: Option<ProgressCallback>,
) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Send {
    let total = bytes.len() as u64;
    stream::unfold((bytes, 0usize, false), move |(buf, offset, done)| {
        let gauge = Arc::clone(&gauge);
        let cb = cb.clone();
        async move {
            if offset >= buf.len() {
                if !done {
                    if let Some(ref cb) = cb {
                        cb.on_processing();
                    }
                }
                return None;
            }
            let end = (offset + CHUNK_SIZE).min(buf.len());
            let is_last = end == buf.len();
            let chunk = buf[offset..end].to_vec();
            let sent = end as u64;
            let pct = gauge.record(sent);
            if let Some(ref cb) = cb {
                cb.on_upload_progress(sent, total, pct);
                if is_last {
                    cb.on_processing();
                }
            }
            Some((Ok(chunk), (buf, end, is_last)))
        }
    })
}

/// Map a reqwest send error to the transport taxonomy.
fn classify_transport_error(e: reqwest::Error, config: &ConversionConfig) -> DocswapError {
    if e.is_timeout() {
        DocswapError::RequestTimeout {
            secs: config.request_timeout_secs,
        }
    } else if e.is_connect() {
        DocswapError::ConnectFailed {
            endpoint: config.endpoint.clone(),
            reason: e.to_string(),
        }
    } else {
        DocswapError::RequestFailed {
            reason: e.to_string(),
        }
    }
}

/// Build a [`DocswapError::ProviderRejected`] from a non-2xx response,
/// preferring the provider's structured `{Code, Message}` body.
fn provider_rejection(status: u16, body: &str) -> DocswapError {
    #[derive(serde::Deserialize)]
    struct ApiErrorBody {
        #[serde(rename = "Code")]
        code: Option<i64>,
        #[serde(rename = "Message")]
        message: Option<String>,
    }

    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if parsed.message.is_some() => DocswapError::ProviderRejected {
            status,
            code: parsed.code,
            message: parsed.message.unwrap_or_default(),
        },
        _ => DocswapError::ProviderRejected {
            status,
            code: None,
            message: truncate(body, 200),
        },
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}
