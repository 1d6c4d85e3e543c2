//! `GET /api/graph`: export of the union graph.

use axum::{
    extract::{Query, State},
    http::Method,
    response::Response,
    routing::get,
};
use serde::Deserialize;

use super::{blocking, format, routes::Routes};
use crate::{
    app::AppContext,
    store::{format::serialize, RdfFormat},
    Result,
};

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
}

pub async fn export(
    State(ctx): State<AppContext>,
    Query(params): Query<ExportParams>,
) -> Result<Response> {
    let format = params
        .format
        .as_deref()
        .map(RdfFormat::from_id)
        .unwrap_or_default();

    let body = blocking(move || {
        let txn = ctx.store.begin_read();
        let union = txn.union_graph();
        txn.end();
        Ok(serialize(union.iter(), format)?)
    })
    .await?;

    format::rdf(format, body)
}

pub fn routes() -> Routes {
    Routes::at("/api").add("/graph", Method::GET, get(export))
}
