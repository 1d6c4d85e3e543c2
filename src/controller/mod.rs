//! HTTP surface of the server.
//!
//! Handlers take [`AppContext`](crate::app::AppContext) as axum state and
//! return [`Result<Response>`](crate::Result). Errors become responses through
//! the [`IntoResponse`] implementation below: plain text for generic failures,
//! the JSON validation report for rejected JSON-LD.
//!
//! # Example
//!
//! ```rust
//! use axum::routing::get;
//! use ontobind::{controller::{format, Routes}, Result};
//!
//! async fn hello() -> Result<axum::response::Response> {
//!     format::text("hello")
//! }
//!
//! let routes = Routes::at("/api").add("/hello", axum::http::Method::GET, get(hello));
//! ```

pub mod app_routes;
pub mod files;
pub mod format;
pub mod graph;
pub mod load;
pub mod monitoring;
pub mod ontologies;
pub mod query;
pub mod rebind;
pub mod routes;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

pub use app_routes::{AppRoutes, ListRoutes};
pub use routes::Routes;

use crate::{errors::Error, Result};

impl Error {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_)
            | Self::UnsafeContent(_)
            | Self::MalformedRdf(_)
            | Self::Query(_)
            | Self::PathRejected { .. } => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::QueryTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::UnsafeContent(report) => {
                tracing::warn!(
                    target: "security",
                    base_iri = ?report.base_iri,
                    errors = ?report.errors,
                    "jsonld_rejected"
                );
                return (status, Json(report)).into_response();
            }
            Self::PathRejected { path, reason } => {
                tracing::warn!(target: "security", path = path.as_str(), reason, "ontology_path_rejected");
            }
            Self::QueryTimeout(limit) => {
                tracing::warn!(timeout = ?limit, "sparql_query_timeout");
            }
            _ if status.is_server_error() => {
                tracing::error!(err.msg = %self, err.detail = ?self, "controller_error");
            }
            _ => {
                tracing::debug!(err.msg = %self, status = status.as_u16(), "request_rejected");
            }
        }

        let message = if status.is_server_error() && !matches!(self, Self::QueryTimeout(_)) {
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };
        (status, message).into_response()
    }
}

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed() -> Error {
    Error::MethodNotAllowed
}

/// Runs CPU-bound work on the blocking pool.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| Error::Message(format!("blocking task failed: {err}")))?
}

/// Decodes a JSON request body; any failure is the client's.
pub(crate) fn json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|err| Error::BadRequest(format!("Invalid JSON body: {err}")))
}
