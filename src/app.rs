//! Shared application state handed to every controller.

use std::{path::PathBuf, sync::Arc};

use crate::{
    config::Config,
    environment::Environment,
    ontology::{IriSafetyValidator, OntologyRegistry, Rebinders, SafetyPolicy},
    store::GraphStore,
};

/// Cheap to clone: everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct AppContext {
    pub environment: Environment,
    pub config: Arc<Config>,
    pub registry: Arc<OntologyRegistry>,
    pub rebinders: Arc<Rebinders>,
    pub safety_policy: Arc<SafetyPolicy>,
    pub store: Arc<GraphStore>,
}

impl AppContext {
    #[must_use]
    pub fn validator(&self) -> IriSafetyValidator<'_> {
        IriSafetyValidator::new(&self.registry, &self.safety_policy)
    }

    /// Directory served under `/ontology/`.
    #[must_use]
    pub fn ontology_root(&self) -> PathBuf {
        self.config.repository.ontology_root()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("environment", &self.environment)
            .field("ontologies", &self.registry.list().len())
            .field("transactions_opened", &self.store.transactions_opened())
            .finish_non_exhaustive()
    }
}
