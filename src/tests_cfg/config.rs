use std::path::Path;

use crate::config::{self, Config};

/// Configuration pointing at a fixture repository. Preloading is off so the
/// store starts empty; logging is off so tests can run in parallel.
#[must_use]
pub fn test_config(repository_root: &Path) -> Config {
    Config {
        logger: config::Logger {
            enable: false,
            ..config::Logger::default()
        },
        server: config::Server {
            body_limit: "64kb".to_string(),
            ..config::Server::default()
        },
        repository: config::Repository {
            root: Some(repository_root.to_path_buf()),
            preload: false,
            ..config::Repository::default()
        },
        ..Config::default()
    }
}
