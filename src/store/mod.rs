//! In-memory RDF store: transactional graphs, wire formats and SPARQL.

pub mod format;
pub mod graph;
pub mod sparql;

use std::time::Duration;

pub use format::RdfFormat;
pub use graph::{GraphStore, GraphTarget, ReadTransaction, Snapshot, WriteTransaction};
pub use sparql::{PreparedQuery, QueryForm, QueryOutcome, SolutionTable};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Parse(String),

    #[error("cannot serialize graph: {0}")]
    Serialize(String),

    #[error("{0}")]
    Syntax(String),

    #[error("query evaluation failed: {0}")]
    Evaluation(String),

    #[error("query evaluation exceeded {0:?}")]
    Timeout(Duration),

    #[error("unsupported RDF format {0}")]
    UnsupportedFormat(&'static str),
}
