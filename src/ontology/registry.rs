//! The ontology registry: which ontologies exist, their localhost and
//! production namespace prefixes, their JSON-LD context and their source file.
//!
//! The registry is read once at startup from a YAML file and is immutable
//! afterwards. Any inconsistency aborts startup.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};

use super::value_objects::{Iri, IriError};

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("cannot read registry {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse registry {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("repository root {path} is not accessible: {source}")]
    Root {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("duplicate ontology key `{0}`")]
    DuplicateKey(String),

    #[error("ontology `{key}` is missing required field `{field}`")]
    MissingField { key: String, field: &'static str },

    #[error("ontology `{key}` has an invalid {field}: {source}")]
    InvalidIri {
        key: String,
        field: &'static str,
        source: IriError,
    },

    #[error("ontology `{key}` uses the same prefix for localhost and production")]
    IdenticalPrefixes { key: String },

    #[error("localhost prefix {localhost} overlaps production prefix {production}")]
    OverlappingPrefixes {
        localhost: String,
        production: String,
    },

    #[error("ontology `{key}` references missing file {path}")]
    MissingFile { key: String, path: PathBuf },

    #[error("ontology `{key}` references {path} outside the repository root")]
    FileOutsideRoot { key: String, path: PathBuf },

    #[error("unknown ontology `{0}`")]
    UnknownOntology(String),
}

/// One registered ontology.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OntologyEntry {
    pub key: String,
    pub localhost_iri: Iri,
    pub production_iri: Iri,
    pub context_url: String,
    /// Path as written in the registry, relative to the repository root.
    pub file: PathBuf,
    /// Canonical location of `file`.
    #[serde(skip)]
    pub resolved_file: PathBuf,
}

impl OntologyEntry {
    #[must_use]
    pub fn prefix_for(&self, site: Site) -> &Iri {
        match site {
            Site::Localhost => &self.localhost_iri,
            Site::Production => &self.production_iri,
        }
    }
}

/// The two deployment sites an IRI can belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Site {
    Localhost,
    Production,
}

/// Optional `localhost:` / `production:` blocks of the registry file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SiteConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    localhost: Option<SiteConfig>,
    #[serde(default)]
    production: Option<SiteConfig>,
    ontologies: OrderedEntries,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    localhost_iri: Option<String>,
    production_iri: Option<String>,
    context_url: Option<String>,
    file: Option<String>,
}

/// Mapping that keeps declaration order and surfaces duplicate keys instead
/// of letting the last one win.
#[derive(Debug, Default)]
struct OrderedEntries(Vec<(String, RawEntry)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a mapping of ontology keys to entries")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(OrderedEntries::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or_default());
                while let Some((key, entry)) = map.next_entry::<String, Option<RawEntry>>()? {
                    entries.push((key, entry.unwrap_or_default()));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_any(EntriesVisitor)
    }
}

/// Validated, immutable set of ontology entries.
#[derive(Clone, Debug, Default)]
pub struct OntologyRegistry {
    entries: Vec<OntologyEntry>,
    localhost: Option<SiteConfig>,
    production: Option<SiteConfig>,
    context_pairs: Vec<(String, String)>,
}

impl OntologyRegistry {
    /// Reads and validates the registry at `path`. Entry files are resolved
    /// against `repo_root`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on I/O, YAML or consistency failures.
    pub fn load(path: &Path, repo_root: &Path) -> Result<Self, RegistryError> {
        let content = fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content, repo_root).map_err(|err| match err {
            RegistryError::Parse { source, .. } => RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parses and validates registry text.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on YAML or consistency failures.
    pub fn from_yaml(content: &str, repo_root: &Path) -> Result<Self, RegistryError> {
        let document: RegistryDocument =
            serde_yaml::from_str(content).map_err(|source| RegistryError::Parse {
                path: PathBuf::new(),
                source,
            })?;

        let root = fs::canonicalize(repo_root).map_err(|source| RegistryError::Root {
            path: repo_root.to_path_buf(),
            source,
        })?;

        let mut entries: Vec<OntologyEntry> = Vec::with_capacity(document.ontologies.0.len());
        for (key, raw) in document.ontologies.0 {
            if entries.iter().any(|e| e.key == key) {
                return Err(RegistryError::DuplicateKey(key));
            }
            entries.push(validate_entry(key, raw, &root)?);
        }
        check_overlaps(&entries)?;

        let context_pairs = derive_context_pairs(
            &entries,
            document.localhost.as_ref(),
            document.production.as_ref(),
        );

        tracing::debug!(ontologies = entries.len(), "ontology registry loaded");
        Ok(Self {
            entries,
            localhost: document.localhost,
            production: document.production,
            context_pairs,
        })
    }

    /// Entries in declaration order.
    #[must_use]
    pub fn list(&self) -> &[OntologyEntry] {
        &self.entries
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownOntology`] when no entry has `key`.
    pub fn resolve(&self, key: &str) -> Result<&OntologyEntry, RegistryError> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .ok_or_else(|| RegistryError::UnknownOntology(key.to_string()))
    }

    #[must_use]
    pub fn site(&self, site: Site) -> Option<&SiteConfig> {
        match site {
            Site::Localhost => self.localhost.as_ref(),
            Site::Production => self.production.as_ref(),
        }
    }

    /// Every registered localhost and production prefix.
    pub fn prefixes(&self) -> impl Iterator<Item = &Iri> {
        self.entries
            .iter()
            .flat_map(|e| [&e.localhost_iri, &e.production_iri])
    }

    /// Whether `value` is exactly one of the registered prefixes.
    #[must_use]
    pub fn is_registered_prefix(&self, value: &str) -> bool {
        self.prefixes().any(|prefix| prefix.as_str() == value)
    }

    /// Registered prefixes followed by every context URL, production
    /// counterparts included.
    #[must_use]
    pub fn namespace_families(&self) -> Vec<&str> {
        let mut families: Vec<&str> = Vec::new();
        let candidates = self
            .prefixes()
            .map(Iri::as_str)
            .chain(self.entries.iter().map(|entry| entry.context_url.as_str()))
            .chain(self.context_pairs.iter().map(|(_, production)| production.as_str()));
        for family in candidates {
            if !families.contains(&family) {
                families.push(family);
            }
        }
        families
    }

    /// `(localhost, production)` context URL pairs derived from the site
    /// base URLs. Empty unless both sites are configured.
    #[must_use]
    pub fn context_pairs(&self) -> &[(String, String)] {
        &self.context_pairs
    }
}

fn derive_context_pairs(
    entries: &[OntologyEntry],
    localhost: Option<&SiteConfig>,
    production: Option<&SiteConfig>,
) -> Vec<(String, String)> {
    let (Some(localhost), Some(production)) = (localhost, production) else {
        return Vec::new();
    };
    let local_base = localhost.base_url.trim_end_matches('/');
    let production_base = production.base_url.trim_end_matches('/');

    let mut pairs: Vec<(String, String)> = Vec::new();
    for entry in entries {
        let Some(rest) = entry.context_url.strip_prefix(local_base) else {
            continue;
        };
        if !rest.is_empty() && !rest.starts_with('/') {
            continue;
        }
        let counterpart = format!("{production_base}{rest}");
        if counterpart != entry.context_url
            && !pairs.iter().any(|(local, _)| *local == entry.context_url)
        {
            pairs.push((entry.context_url.clone(), counterpart));
        }
    }
    pairs
}

fn required(key: &str, field: &'static str, value: Option<String>) -> Result<String, RegistryError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RegistryError::MissingField {
            key: key.to_string(),
            field,
        })
}

fn namespace(key: &str, field: &'static str, value: Option<String>) -> Result<Iri, RegistryError> {
    Iri::new(required(key, field, value)?).map_err(|source| RegistryError::InvalidIri {
        key: key.to_string(),
        field,
        source,
    })
}

fn validate_entry(key: String, raw: RawEntry, root: &Path) -> Result<OntologyEntry, RegistryError> {
    let localhost_iri = namespace(&key, "localhost_iri", raw.localhost_iri)?;
    let production_iri = namespace(&key, "production_iri", raw.production_iri)?;
    if localhost_iri == production_iri {
        return Err(RegistryError::IdenticalPrefixes { key });
    }
    let context_url = required(&key, "context_url", raw.context_url)?;
    let file = PathBuf::from(required(&key, "file", raw.file)?);

    let resolved_file = match fs::canonicalize(root.join(&file)) {
        Ok(path) => path,
        Err(_) => return Err(RegistryError::MissingFile { key, path: file }),
    };
    if !resolved_file.starts_with(root) {
        return Err(RegistryError::FileOutsideRoot { key, path: file });
    }
    if !resolved_file.is_file() {
        return Err(RegistryError::MissingFile { key, path: file });
    }

    Ok(OntologyEntry {
        key,
        localhost_iri,
        production_iri,
        context_url,
        file,
        resolved_file,
    })
}

/// No prefix may serve both directions, otherwise rebinding would be
/// ambiguous.
fn check_overlaps(entries: &[OntologyEntry]) -> Result<(), RegistryError> {
    for local in entries.iter().map(|e| &e.localhost_iri) {
        for production in entries.iter().map(|e| &e.production_iri) {
            if local.overlaps(production) {
                return Err(RegistryError::OverlappingPrefixes {
                    localhost: local.to_string(),
                    production: production.to_string(),
                });
            }
        }
    }
    Ok(())
}
