//! # Application Error Handling
//!
//! Every failure the server can report folds into [`Error`]. Module errors
//! ([`RegistryError`], [`StoreError`], [`ConfigError`]) convert into it with
//! `?`, and the controller layer turns it into an HTTP response.

use std::time::Duration;

use crate::{
    config::ConfigError, ontology::registry::RegistryError, ontology::safety::IriSafetyReport,
    store::StoreError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Not Found")]
    NotFound,

    /// JSON-LD rejected by the IRI safety validator.
    #[error("unsafe JSON-LD payload: {}", .0.errors.join(", "))]
    UnsafeContent(IriSafetyReport),

    #[error("Unable to parse RDF payload: {0}")]
    MalformedRdf(String),

    #[error("Invalid SPARQL query: {0}")]
    Query(String),

    /// A static file request tried to leave the ontology root.
    #[error("Invalid path")]
    PathRejected { path: String, reason: &'static str },

    #[error("Query evaluation exceeded {0:?}")]
    QueryTimeout(Duration),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    JSON(#[from] serde_json::Error),

    #[error(transparent)]
    YAML(#[from] serde_yaml::Error),

    #[error(transparent)]
    Any(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Any(Box::new(err))
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Parse(msg) => Self::MalformedRdf(msg),
            StoreError::Syntax(msg) => Self::Query(msg),
            StoreError::Timeout(limit) => Self::QueryTimeout(limit),
            other => Self::Store(other),
        }
    }
}
