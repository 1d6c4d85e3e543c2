//! `POST /api/load`: merge an RDF document into the default graph.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method},
    response::Response,
    routing::post,
};
use oxrdf::TripleRef;
use serde::Serialize;

use super::{blocking, format, routes::Routes};
use crate::{
    app::AppContext,
    store::{format::parse_graph, GraphTarget, RdfFormat},
    Error, Result,
};

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub ok: bool,
    pub triples_loaded: usize,
}

/// Validates (JSON-LD only), parses and commits `body` into the default
/// graph. Returns the number of triples added.
///
/// # Errors
///
/// [`Error::UnsafeContent`] when JSON-LD fails the IRI checks,
/// [`Error::MalformedRdf`] when the payload does not parse.
pub fn ingest(ctx: &AppContext, format: RdfFormat, body: &[u8]) -> Result<usize> {
    if format == RdfFormat::JsonLd {
        let report = ctx.validator().validate(body);
        if !report.ok {
            return Err(Error::UnsafeContent(report));
        }
    }

    let scratch = parse_graph(body, format, None)?;

    let mut txn = ctx.store.begin_write();
    let loaded = txn.load_into(
        GraphTarget::Default,
        scratch.iter().map(TripleRef::into_owned),
    );
    txn.commit();

    tracing::info!(format = format.id(), triples = loaded, "rdf_loaded");
    Ok(loaded)
}

pub async fn load(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let format = RdfFormat::from_content_type(
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
    );
    let triples_loaded = blocking(move || ingest(&ctx, format, &body)).await?;
    format::json(LoadResponse {
        ok: true,
        triples_loaded,
    })
}

pub fn routes() -> Routes {
    Routes::at("/api").add("/load", Method::POST, post(load))
}
