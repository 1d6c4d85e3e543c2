use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

pub const CORE_LOCALHOST: &str = "http://localhost:8080/onto/core#";
pub const CORE_PRODUCTION: &str = "https://example.org/onto/core#";
pub const CONTEXT_URL: &str = "http://localhost:8080/ontology/context.jsonld";
pub const PRODUCTION_CONTEXT_URL: &str = "https://example.org/ontology/context.jsonld";
pub const REGISTRY_FILE: &str = ".catty/iri-config.yaml";

/// Two triples in the `core` localhost namespace.
pub const CORE_TURTLE: &str = "@prefix core: <http://localhost:8080/onto/core#> .\n\
core:A core:rel core:B .\n\
core:B core:rel core:C .\n";

pub const CONTEXT_JSONLD: &str = r#"{
  "@context": {
    "@base": "http://localhost:8080/onto/core#",
    "core": "http://localhost:8080/onto/core#",
    "rdfs": "http://www.w3.org/2000/01/rdf-schema#"
  }
}
"#;

const REGISTRY: &str = r#"localhost:
  base_url: "http://localhost:8080"
production:
  base_url: "https://example.org"
ontologies:
  core:
    localhost_iri: "http://localhost:8080/onto/core#"
    production_iri: "https://example.org/onto/core#"
    context_url: "http://localhost:8080/ontology/context.jsonld"
    file: "ontology/core.ttl"
"#;

/// Repository laid out like a real checkout: registry under `.catty/`,
/// served files under `ontology/`. Removed on drop.
pub struct RepoFixture {
    dir: TempDir,
}

impl RepoFixture {
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        self.dir.path().join(REGISTRY_FILE)
    }

    #[must_use]
    pub fn ontology_dir(&self) -> PathBuf {
        self.dir.path().join("ontology")
    }

    /// Appends an entry to the registry file.
    ///
    /// # Panics
    ///
    /// Panics when the registry file cannot be written.
    pub fn add_entry(&self, key: &str, localhost_iri: &str, production_iri: &str, file: &str) {
        let mut registry = fs::OpenOptions::new()
            .append(true)
            .open(self.registry_path())
            .expect("open registry");
        write!(
            registry,
            "  {key}:\n    localhost_iri: \"{localhost_iri}\"\n    production_iri: \"{production_iri}\"\n    context_url: \"{CONTEXT_URL}\"\n    file: \"{file}\"\n"
        )
        .expect("append registry entry");
    }
}

/// Creates the fixture repository with the `core` ontology registered.
///
/// # Panics
///
/// Panics when the temporary directory cannot be populated.
#[must_use]
pub fn create() -> RepoFixture {
    let dir = tempfile::tempdir().expect("create temp repository");
    let root = dir.path();
    fs::create_dir_all(root.join(".catty")).expect("create .catty");
    fs::create_dir_all(root.join("ontology/nested")).expect("create ontology dir");
    fs::write(root.join(REGISTRY_FILE), REGISTRY).expect("write registry");
    fs::write(root.join("ontology/core.ttl"), CORE_TURTLE).expect("write core.ttl");
    fs::write(root.join("ontology/context.jsonld"), CONTEXT_JSONLD).expect("write context");
    fs::write(root.join("ontology/README.md"), "# Ontologies\n").expect("write readme");
    fs::write(root.join("ontology/nested/notes.bin"), [0_u8, 1, 2]).expect("write notes");
    fs::write(root.join("secret.txt"), "do not serve").expect("write secret");
    RepoFixture { dir }
}
