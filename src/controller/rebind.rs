//! `POST /api/rebind`: rewrite registered namespaces in submitted text.

use axum::{body::Bytes, extract::State, http::Method, response::Response, routing::post};
use serde::{Deserialize, Serialize};

use super::{format, json_body, routes::Routes};
use crate::{app::AppContext, ontology::RebindTarget, Error, Result};

#[derive(Debug, Default, Deserialize)]
pub struct RebindRequest {
    /// `localhost` or `production`; defaults to `production`.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RebindResponse {
    pub content: String,
}

pub async fn rebind(State(ctx): State<AppContext>, body: Bytes) -> Result<Response> {
    let request: RebindRequest = json_body(&body)?;
    let target = match request.target.as_deref() {
        None => RebindTarget::default(),
        Some(raw) => raw
            .parse::<RebindTarget>()
            .map_err(|err| Error::BadRequest(err.to_string()))?,
    };
    let content = request
        .content
        .ok_or_else(|| Error::BadRequest("Missing required field 'content'".to_string()))?;

    format::json(RebindResponse {
        content: ctx.rebinders.rebind(&content, target),
    })
}

pub fn routes() -> Routes {
    Routes::at("/api").add("/rebind", Method::POST, post(rebind))
}
