//! Read-only view of the ontology registry.

use axum::{
    extract::{Path, State},
    http::Method,
    response::Response,
    routing::get,
};
use serde::Serialize;

use super::{format, routes::Routes};
use crate::{app::AppContext, ontology::OntologyEntry, Error, Result};

#[derive(Debug, Serialize)]
pub struct OntologyView {
    pub key: String,
    pub localhost_iri: String,
    pub production_iri: String,
    pub context_url: String,
    pub file: String,
}

impl From<&OntologyEntry> for OntologyView {
    fn from(entry: &OntologyEntry) -> Self {
        Self {
            key: entry.key.clone(),
            localhost_iri: entry.localhost_iri.to_string(),
            production_iri: entry.production_iri.to_string(),
            context_url: entry.context_url.clone(),
            file: entry.file.to_string_lossy().into_owned(),
        }
    }
}

pub async fn list(State(ctx): State<AppContext>) -> Result<Response> {
    let views: Vec<OntologyView> = ctx.registry.list().iter().map(OntologyView::from).collect();
    format::json(views)
}

pub async fn show(State(ctx): State<AppContext>, Path(key): Path<String>) -> Result<Response> {
    let entry = ctx.registry.resolve(&key).map_err(|_| Error::NotFound)?;
    format::json(OntologyView::from(entry))
}

pub fn routes() -> Routes {
    Routes::at("/api/ontologies")
        .add("/", Method::GET, get(list))
        .add("/{key}", Method::GET, get(show))
}
