//! Initializes the tracing subscriber from [`config::Logger`].

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::{config, Error, Result};

// Dropping the guard flushes and stops the file writer, so it lives as long
// as the process.
static NONBLOCKING_WORK_GUARD_KEEP: OnceLock<WorkerGuard> = OnceLock::new();

const MODULE_WHITELIST: &[&str] = &["ontobind", "tower_http"];

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize)]
pub enum LogLevel {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "info")]
    #[default]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize)]
pub enum Format {
    #[serde(rename = "compact")]
    #[default]
    Compact,
    #[serde(rename = "pretty")]
    Pretty,
    #[serde(rename = "json")]
    Json,
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize)]
pub enum Rotation {
    #[serde(rename = "minutely")]
    Minutely,
    #[serde(rename = "hourly")]
    #[default]
    Hourly,
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "never")]
    Never,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => "off",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
        .fmt(f)
    }
}

/// Builds the filter directive used when no override is configured:
/// our own crates at `level`, everything else silent.
#[must_use]
pub fn default_directive(level: LogLevel) -> String {
    MODULE_WHITELIST
        .iter()
        .map(|m| format!("{m}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level
/// unless `override_filter` is set.
///
/// # Errors
///
/// Fails when a filter directive does not parse or when a global subscriber
/// is already installed.
pub fn init(config: &config::Logger) -> Result<()> {
    if !config.enable {
        return Ok(());
    }

    let mut layers: Vec<Box<dyn Layer<Registry> + Sync + Send>> = Vec::new();

    if let Some(file_appender_config) = config.file_appender.as_ref().filter(|c| c.enable) {
        let dir = file_appender_config
            .dir
            .as_deref()
            .unwrap_or("./logs")
            .to_string();
        let prefix = file_appender_config
            .filename_prefix
            .as_deref()
            .unwrap_or("ontobind.log")
            .to_string();
        let file_appender = match file_appender_config.rotation {
            Rotation::Minutely => tracing_appender::rolling::minutely(dir, prefix),
            Rotation::Hourly => tracing_appender::rolling::hourly(dir, prefix),
            Rotation::Daily => tracing_appender::rolling::daily(dir, prefix),
            Rotation::Never => tracing_appender::rolling::never(dir, prefix),
        };
        let (non_blocking_file_appender, work_guard) =
            tracing_appender::non_blocking(file_appender);
        if NONBLOCKING_WORK_GUARD_KEEP.set(work_guard).is_err() {
            tracing::warn!("file appender already initialized");
        }
        layers.push(init_layer(non_blocking_file_appender, config.format, false));
    }

    layers.push(init_layer(std::io::stdout, config.format, true));

    let env_filter = match &config.override_filter {
        Some(filter) => EnvFilter::try_new(filter),
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_directive(config.level))),
    }
    .map_err(|err| Error::Message(format!("invalid log filter: {err}")))?;

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|err| Error::Message(format!("logger already initialized: {err}")))
}

fn init_layer<W2>(
    make_writer: W2,
    format: Format,
    ansi: bool,
) -> Box<dyn Layer<Registry> + Sync + Send>
where
    W2: for<'writer> MakeWriter<'writer> + Sync + Send + 'static,
{
    match format {
        Format::Compact => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .compact()
            .boxed(),
        Format::Pretty => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .pretty()
            .boxed(),
        Format::Json => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .json()
            .boxed(),
    }
}
