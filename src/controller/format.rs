//! Response builders used by the handlers.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{store::RdfFormat, Error, Result};

/// Returns a JSON response.
///
/// # Errors
///
/// Currently this function doesn't return any error; the `Result` keeps
/// handler code uniform.
pub fn json<T: Serialize>(t: T) -> Result<Response> {
    Ok(Json(t).into_response())
}

/// Returns a plain text response.
///
/// # Errors
///
/// Currently this function doesn't return any error.
pub fn text(t: &str) -> Result<Response> {
    Ok(t.to_string().into_response())
}

/// Returns `body` with an explicit `Content-Type`.
///
/// # Errors
///
/// Fails when `content_type` is not a valid header value.
pub fn render(content_type: &str, body: impl Into<Body>) -> Result<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .map_err(Error::wrap)
}

/// Returns serialized RDF in `format`.
///
/// # Errors
///
/// See [`render`].
pub fn rdf(format: RdfFormat, body: Vec<u8>) -> Result<Response> {
    render(format.content_type(), body)
}
