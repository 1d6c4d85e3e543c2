//! # Configuration Management
//!
//! Configuration is loaded from `config/<environment>.yaml` (a
//! `<environment>.local.yaml` next to it takes precedence). Files are rendered
//! through tera first, so values can be pulled from the process environment:
//!
//! ```yaml
//! server:
//!   port: {{ get_env(name="ONTOBIND_PORT", default="8080") }}
//! ```
//!
//! Every section has defaults; when no file exists the defaults form a usable
//! development configuration.
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{environment::Environment, logger, Result};

pub const CONFIG_FOLDER_ENV: &str = "ONTOBIND_CONFIG_FOLDER";
const DEFAULT_CONFIG_FOLDER: &str = "config";

/// Vocabularies that JSON-LD payloads may reference besides the registered
/// namespaces.
pub const DEFAULT_EXTERNAL_PREFIXES: &[&str] = &[
    "http://www.w3.org/",
    "https://www.w3.org/",
    "http://purl.org/",
    "https://purl.org/",
    "http://schema.org/",
    "https://schema.org/",
    "http://dbpedia.org/",
    "https://dbpedia.org/",
    "http://www.wikidata.org/",
    "https://www.wikidata.org/",
    "http://doi.org/",
    "https://doi.org/",
    "http://arxiv.org/",
    "https://arxiv.org/",
    "http://en.wikipedia.org/",
    "https://en.wikipedia.org/",
];

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot render config file {path}: {message}")]
    Render { path: PathBuf, message: String },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid server.body_limit `{0}`")]
    BodyLimit(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logger: Logger,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub repository: Repository,
    #[serde(default)]
    pub sparql: Sparql,
    #[serde(default)]
    pub validation: Validation,
}

/// Logger configuration
///
/// Example (development):
/// ```yaml
/// logger:
///   enable: true
///   level: debug
///   format: compact
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logger {
    /// Enable log write to stdout
    pub enable: bool,

    /// Set the logger level.
    ///
    /// * options: `trace` | `debug` | `info` | `warn` | `error`
    #[serde(default)]
    pub level: logger::LogLevel,

    /// Set the logger format.
    ///
    /// * options: `compact` | `pretty` | `json`
    #[serde(default)]
    pub format: logger::Format,

    /// Override our custom tracing filter.
    ///
    /// Set this to your own filter if you want to see traces from internal
    /// libraries. See more [here](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives)
    pub override_filter: Option<String>,

    /// Set this if you want to write log to file
    pub file_appender: Option<LoggerFileAppender>,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            enable: true,
            level: logger::LogLevel::default(),
            format: logger::Format::default(),
            override_filter: None,
            file_appender: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggerFileAppender {
    pub enable: bool,
    #[serde(default)]
    pub rotation: logger::Rotation,
    pub dir: Option<String>,
    pub filename_prefix: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Server {
    #[serde(default = "default_binding")]
    pub binding: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request body ceiling, as a byte-unit string (`1mb`, `512kb`).
    #[serde(default = "default_body_limit")]
    pub body_limit: String,
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Upper bound of the blocking pool used for parsing and evaluation.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            binding: default_binding(),
            port: default_port(),
            body_limit: default_body_limit(),
            request_timeout: default_request_timeout(),
            worker_threads: default_worker_threads(),
        }
    }
}

impl Server {
    #[must_use]
    pub fn full_url(&self) -> String {
        format!("http://{}:{}", self.binding, self.port)
    }

    /// Parses `body_limit` into a byte count.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BodyLimit`] when the value is not a byte-unit
    /// string or does not fit in `usize`.
    pub fn body_limit_bytes(&self) -> std::result::Result<usize, ConfigError> {
        let bytes = byte_unit::Byte::from_str(&self.body_limit)
            .map_err(|_| ConfigError::BodyLimit(self.body_limit.clone()))?;
        usize::try_from(bytes.get_bytes()).map_err(|_| ConfigError::BodyLimit(self.body_limit.clone()))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }
}

/// Where the ontology repository lives on disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Repository {
    /// Unset means: search upward from the working directory for the
    /// registry file.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Registry file, relative to `root`.
    #[serde(default = "default_registry")]
    pub registry: PathBuf,
    /// Directory served under `/ontology/`, relative to `root`.
    #[serde(default = "default_ontology_dir")]
    pub ontology_dir: PathBuf,
    /// Parse every registered file into its own named graph at boot.
    #[serde(default = "default_true")]
    pub preload: bool,
}

impl Default for Repository {
    fn default() -> Self {
        Self {
            root: None,
            registry: default_registry(),
            ontology_dir: default_ontology_dir(),
            preload: true,
        }
    }
}

impl Repository {
    /// The configured or located root; the working directory while unset.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.as_deref().unwrap_or_else(|| Path::new("."))
    }

    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        self.root().join(&self.registry)
    }

    #[must_use]
    pub fn ontology_root(&self) -> PathBuf {
        self.root().join(&self.ontology_dir)
    }

    /// Fills in an unset `root` with the nearest directory at or above
    /// `start` that holds the registry file, falling back to `start`.
    pub fn locate_root(&mut self, start: &Path) {
        if self.root.is_some() {
            return;
        }
        let root = start
            .ancestors()
            .find(|dir| dir.join(&self.registry).is_file())
            .unwrap_or(start)
            .to_path_buf();
        tracing::debug!(root = %root.display(), "repository root located");
        self.root = Some(root);
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Sparql {
    /// Evaluation budget in milliseconds.
    #[serde(default = "default_sparql_timeout")]
    pub timeout: u64,
}

impl Default for Sparql {
    fn default() -> Self {
        Self {
            timeout: default_sparql_timeout(),
        }
    }
}

impl Sparql {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Validation {
    #[serde(default = "default_external_prefixes")]
    pub allowed_external_prefixes: Vec<String>,
}

impl Default for Validation {
    fn default() -> Self {
        Self {
            allowed_external_prefixes: default_external_prefixes(),
        }
    }
}

fn default_binding() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> String {
    "1mb".to_string()
}

const fn default_request_timeout() -> u64 {
    30_000
}

const fn default_worker_threads() -> usize {
    16
}

fn default_registry() -> PathBuf {
    PathBuf::from(".catty/iri-config.yaml")
}

fn default_ontology_dir() -> PathBuf {
    PathBuf::from("ontology")
}

const fn default_true() -> bool {
    true
}

const fn default_sparql_timeout() -> u64 {
    10_000
}

fn default_external_prefixes() -> Vec<String> {
    DEFAULT_EXTERNAL_PREFIXES
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Config {
    /// Loads the configuration of `env` from the config folder
    /// (`ONTOBIND_CONFIG_FOLDER`, or `config`).
    ///
    /// # Errors
    ///
    /// Returns an error when a config file exists but cannot be read,
    /// rendered or parsed.
    pub fn new(env: &Environment) -> Result<Self> {
        let folder = std::env::var(CONFIG_FOLDER_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FOLDER), PathBuf::from);
        Self::from_folder(env, &folder)
    }

    /// Loads configuration for `env` from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when a config file exists but cannot be read,
    /// rendered or parsed.
    pub fn from_folder(env: &Environment, path: &Path) -> Result<Self> {
        let files = [
            path.join(format!("{env}.local.yaml")),
            path.join(format!("{env}.yaml")),
        ];
        let Some(selected_path) = files.iter().find(|p| p.exists()) else {
            tracing::info!(
                environment = %env,
                folder = %path.display(),
                "no config file found, using defaults"
            );
            return Ok(Self::default());
        };

        let content = fs::read_to_string(selected_path).map_err(|source| ConfigError::Read {
            path: selected_path.clone(),
            source,
        })?;
        Ok(Self::from_yaml(&content, selected_path)?)
    }

    /// Renders and parses configuration text. `origin` names the source in
    /// error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when rendering or parsing fails.
    pub fn from_yaml(content: &str, origin: &Path) -> std::result::Result<Self, ConfigError> {
        let rendered = render_template(content).map_err(|err| ConfigError::Render {
            path: origin.to_path_buf(),
            message: err.to_string(),
        })?;
        if rendered.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&rendered).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }
}

fn render_template(content: &str) -> tera::Result<String> {
    let mut tera = tera::Tera::default();
    tera.register_function("get_env", get_env);
    tera.render_str(content, &tera::Context::new())
}

/// `get_env(name="VAR", default="value")`
fn get_env(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let name = args
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg("get_env requires a `name` argument"))?;
    match std::env::var(name) {
        Ok(value) => Ok(Value::String(value)),
        Err(_) => args
            .get("default")
            .cloned()
            .ok_or_else(|| tera::Error::msg(format!("environment variable `{name}` is not set"))),
    }
}
