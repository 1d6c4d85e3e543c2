//! Liveness route used by process supervisors and load balancers.

use axum::{http::Method, response::Response, routing::get};

use super::{format, routes::Routes};
use crate::Result;

/// Check application health endpoint
///
/// # Errors
/// This function always returns `Ok` with a plain `ok` body.
pub async fn health() -> Result<Response> {
    format::text("ok")
}

pub fn routes() -> Routes {
    Routes::new().add("/health", Method::GET, get(health))
}
