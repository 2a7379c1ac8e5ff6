//! HTTP exposition endpoints.
//!
//! - `/stats`            : plain `name: value` listing
//! - `/stats/prometheus` : Prometheus text format
//!
//! Bodies are gzip-compressed when the request's `Accept-Encoding` allows it.

use std::io::Write;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use flate2::{write::GzEncoder, Compression};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use scopestat_core::Store;

use crate::error::{ExportError, Result};
use crate::format::{format_store, Formatter, PlainFormatter, PrometheusFormatter};

#[derive(Clone)]
pub struct ExpositionState {
    store: Store,
    namespace: Arc<str>,
}

impl ExpositionState {
    pub fn new(store: Store, namespace: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }
}

pub fn build_router(store: Store, namespace: impl Into<Arc<str>>) -> Router {
    Router::new()
        .route("/stats", get(plain))
        .route("/stats/prometheus", get(prometheus))
        .with_state(ExpositionState::new(store, namespace))
}

/// Serve the exposition router on `listener` until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    store: Store,
    namespace: impl Into<Arc<str>>,
    cancel: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "stats exposition listening");
    axum::serve(listener, build_router(store, namespace))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;
    Ok(())
}

pub async fn plain(State(state): State<ExpositionState>, headers: HeaderMap) -> Result<Response> {
    render(&mut PlainFormatter::new(), &state.store, &headers)
}

pub async fn prometheus(State(state): State<ExpositionState>, headers: HeaderMap) -> Result<Response> {
    render(
        &mut PrometheusFormatter::new(&*state.namespace),
        &state.store,
        &headers,
    )
}

fn render(formatter: &mut dyn Formatter, store: &Store, headers: &HeaderMap) -> Result<Response> {
    let body = format_store(formatter, store);
    let content_type = HeaderValue::from_static(formatter.content_type());

    if !gzip_accepted(headers) {
        return Ok((StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response());
    }

    let compressed = gzip(body.as_bytes())?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_ENCODING, HeaderValue::from_static("gzip")),
        ],
        compressed,
    )
        .into_response())
}

fn gzip(body: &[u8]) -> Result<Vec<u8>> {
    let mut enc = GzEncoder::new(Vec::with_capacity(body.len() / 4), Compression::default());
    enc.write_all(body)
        .map_err(|e| ExportError::Encode(format!("gzip write failed: {e}")))?;
    enc.finish()
        .map_err(|e| ExportError::Encode(format!("gzip finish failed: {e}")))
}

/// True when any `Accept-Encoding` entry is `gzip` or `gzip;q=...`.
pub fn gzip_accepted(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|part| part == "gzip" || part.starts_with("gzip;"))
}
