//! `POST /api/query`: SPARQL over the committed store.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method},
    response::Response,
    routing::post,
};
use serde::Deserialize;
use serde_json::json;

use super::{blocking, format, json_body, routes::Routes};
use crate::{
    app::AppContext,
    store::{
        format::serialize, sparql::SPARQL_RESULTS_JSON, PreparedQuery, QueryOutcome, RdfFormat,
    },
    Error, Result,
};

#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Serialization of CONSTRUCT/DESCRIBE results.
    #[serde(default)]
    pub format: Option<String>,
}

pub async fn query(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let request: QueryRequest = json_body(&body)?;
    let text = request
        .query
        .filter(|query| !query.trim().is_empty())
        .ok_or_else(|| Error::BadRequest("Missing required field 'query'".to_string()))?;

    // Syntax errors are reported before any transaction is opened.
    let prepared = PreparedQuery::parse(&text)?;

    let graph_format = request.format.as_deref().map_or_else(
        || {
            headers
                .get(header::ACCEPT)
                .and_then(|value| value.to_str().ok())
                .and_then(RdfFormat::from_accept)
                .unwrap_or_default()
        },
        RdfFormat::from_id,
    );
    let timeout = ctx.config.sparql.timeout();

    let outcome = blocking(move || {
        let txn = ctx.store.begin_read();
        let outcome = prepared.execute(txn.dataset(), timeout);
        txn.end();
        Ok(outcome?)
    })
    .await?;

    match outcome {
        QueryOutcome::Solutions(table) => format::render(
            SPARQL_RESULTS_JSON,
            serde_json::to_vec(&table.to_json())?,
        ),
        QueryOutcome::Boolean(value) => format::json(json!({ "boolean": value })),
        QueryOutcome::Graph(graph) => {
            let body = serialize(graph.iter(), graph_format)?;
            format::rdf(graph_format, body)
        }
    }
}

pub fn routes() -> Routes {
    Routes::at("/api").add("/query", Method::POST, post(query))
}
