//! Startup: builds the [`AppContext`], preloads the registry's ontologies and
//! runs the HTTP server.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::{
    app::AppContext,
    config::Config,
    controller::AppRoutes,
    environment::Environment,
    ontology::{OntologyRegistry, Rebinders, SafetyPolicy},
    store::{format::parse_triples, GraphStore, GraphTarget, RdfFormat},
    Error, Result,
};

/// Loads the registry and builds the shared context. Misconfiguration is
/// fatal here rather than at request time.
///
/// # Errors
///
/// Fails when the registry cannot be loaded or validated, or when no
/// repository root is configured and the working directory is unreadable.
pub fn create_context(environment: &Environment, mut config: Config) -> Result<AppContext> {
    if config.repository.root.is_none() {
        config.repository.locate_root(&std::env::current_dir()?);
    }
    let registry = OntologyRegistry::load(
        &config.repository.registry_path(),
        config.repository.root(),
    )?;
    let rebinders = Rebinders::new(&registry).map_err(Error::wrap)?;
    let safety_policy = SafetyPolicy::from(config.validation.clone());

    let store = GraphStore::new();
    if config.repository.preload {
        preload(&store, &registry);
    }

    Ok(AppContext {
        environment: environment.clone(),
        config: Arc::new(config),
        registry: Arc::new(registry),
        rebinders: Arc::new(rebinders),
        safety_policy: Arc::new(safety_policy),
        store: Arc::new(store),
    })
}

/// Parses every registered file into a named graph named by the entry's
/// localhost IRI, in one write transaction. Files that do not parse are
/// logged and skipped. Returns the number of triples loaded.
pub fn preload(store: &GraphStore, registry: &OntologyRegistry) -> usize {
    let mut txn = store.begin_write();
    let mut total = 0;
    for entry in registry.list() {
        let format = RdfFormat::from_extension(&entry.resolved_file).unwrap_or_default();
        let triples = std::fs::read(&entry.resolved_file)
            .map_err(Error::from)
            .and_then(|bytes| {
                Ok(parse_triples(
                    &bytes,
                    format,
                    Some(entry.localhost_iri.as_str()),
                )?)
            });
        match triples {
            Ok(triples) => {
                let graph = oxrdf::NamedNode::new_unchecked(entry.localhost_iri.as_str());
                let loaded = txn.load_into(GraphTarget::Named(graph), triples);
                tracing::info!(ontology = entry.key.as_str(), triples = loaded, "ontology_preloaded");
                total += loaded;
            }
            Err(err) => {
                tracing::warn!(
                    ontology = entry.key.as_str(),
                    file = %entry.file.display(),
                    err.msg = %err,
                    "ontology_preload_skipped"
                );
            }
        }
    }
    txn.commit();
    total
}

/// Builds the application router for `ctx`.
///
/// # Errors
///
/// Fails when the server configuration is invalid.
pub fn create_router(ctx: &AppContext) -> Result<Router> {
    AppRoutes::with_default_routes().to_router(ctx.clone())
}

/// Binds the configured address and serves until Ctrl-C.
///
/// # Errors
///
/// Fails when the address cannot be bound or the server stops abnormally.
pub async fn start(ctx: AppContext) -> Result<()> {
    let router = create_router(&ctx)?;
    let server = &ctx.config.server;
    let listener = TcpListener::bind((server.binding.as_str(), server.port)).await?;

    tracing::info!(
        environment = %ctx.environment,
        url = %server.full_url(),
        ontologies = ctx.registry.list().len(),
        "listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(err.msg = %err, "shutdown_signal_error");
    }
}
