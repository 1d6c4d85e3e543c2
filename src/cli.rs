//! Command line entry point.
//!
//! ```sh
//! ontobind start --environment production --port 8080 --repo /srv/ontologies
//! ontobind routes
//! ontobind check
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::{
    boot,
    config::Config,
    controller::AppRoutes,
    environment::{resolve_from_env, Environment},
    logger,
    ontology::OntologyRegistry,
    Error, Result,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Specify the environment
    #[arg(short, long, global = true, help = &format!("Specify the environment [default: {}]", resolve_from_env()))]
    environment: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Start {
        /// server bind address
        #[arg(short, long)]
        binding: Option<String>,
        /// server port address
        #[arg(short, long)]
        port: Option<u16>,
        /// ontology repository root
        #[arg(long)]
        repo: Option<PathBuf>,
    },
    /// Describe all application endpoints
    Routes {},
    /// Validate configuration and the ontology registry
    Check {
        /// ontology repository root
        #[arg(long)]
        repo: Option<PathBuf>,
    },
}

/// Parses arguments and runs the selected command.
///
/// # Errors
///
/// Returns any configuration, registry or server error; the binary exits
/// non-zero on them.
pub fn main() -> Result<()> {
    let cli = Cli::parse();
    let environment: Environment = cli.environment.unwrap_or_else(resolve_from_env).into();
    let mut config = environment.load()?;

    match cli.command {
        Commands::Start {
            binding,
            port,
            repo,
        } => {
            if let Some(binding) = binding {
                config.server.binding = binding;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(repo) = repo {
                config.repository.root = Some(repo);
            }
            logger::init(&config.logger)?;
            start(&environment, config)
        }
        Commands::Routes {} => {
            for route in AppRoutes::with_default_routes().collect() {
                println!("{route}");
            }
            Ok(())
        }
        Commands::Check { repo } => {
            if let Some(repo) = repo {
                config.repository.root = Some(repo);
            }
            check(config)
        }
    }
}

fn start(environment: &Environment, config: Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(config.server.worker_threads.max(1))
        .build()?;
    let ctx = boot::create_context(environment, config)?;
    runtime.block_on(boot::start(ctx))
}

fn check(mut config: Config) -> Result<()> {
    config.server.body_limit_bytes()?;
    if config.repository.root.is_none() {
        config.repository.locate_root(&std::env::current_dir()?);
    }
    let registry = OntologyRegistry::load(
        &config.repository.registry_path(),
        config.repository.root(),
    )
    .map_err(|err| {
        eprintln!("registry: {err}");
        Error::from(err)
    })?;

    for entry in registry.list() {
        println!(
            "{}: {} <-> {} ({})",
            entry.key,
            entry.localhost_iri,
            entry.production_iri,
            entry.file.display()
        );
    }
    println!("{} ontologies OK", registry.list().len());
    Ok(())
}
