use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::caller::AnyCaller;
use crate::files::{Caller, FileStore};
use crate::state::AppState;
use crate::utils::encoding::accepts_gzip;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[utoipa::path(
    get,
    path = "/static/{name}",
    tag = "Content",
    operation_id = "serveFile",
    summary = "Download file content",
    description = "Streams the file bytes. Anonymous callers can only read public files. When \
        `Accept-Encoding` admits gzip the precomputed mirror is sent with \
        `Content-Encoding: gzip`.",
    params(
        ("name" = String, Path, description = "File name"),
        ("id" = Option<String>, Header, description = "Caller identity"),
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Stored content missing (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller, headers), fields(caller = ?caller, locator))]
pub async fn serve_file(
    AnyCaller(caller): AnyCaller,
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let store = FileStore::new(&state.db);
    let resolved = match &caller {
        Caller::Anonymous => store.resolve_public_content_locator(&name).await?,
        identified => store.resolve_content_locator(identified, &name).await?,
    };
    tracing::Span::current().record("locator", resolved.locator.as_str());

    let served = state
        .content
        .serve(&resolved.locator, accepts_gzip(&headers))
        .await?;

    let content_type = resolved.mime.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
    let body = Body::from_stream(ReaderStream::new(served.content.reader));

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, served.content.len.to_string())
        .header(header::VARY, "Accept-Encoding")
        .header(header::CONTENT_DISPOSITION, content_disposition_value(&name));
    if let Some(encoding) = served.encoding {
        builder = builder.header(header::CONTENT_ENCODING, encoding);
    }

    builder
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Build a safe inline `Content-Disposition` header value.
pub fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("inline; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
