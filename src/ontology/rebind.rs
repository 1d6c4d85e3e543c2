//! Textual rebinding between the localhost and production namespaces.
//!
//! Rewriting is a plain substitution over the text, so it works for Turtle,
//! JSON-LD and RDF/XML alike. A string literal that happens to contain a
//! registered prefix is rewritten too.

use std::{collections::HashMap, fmt, str::FromStr};

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::registry::{OntologyRegistry, Site};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RebindError {
    #[error("Invalid target; expected 'localhost' or 'production'")]
    InvalidTarget(String),
}

/// Direction of a rebind request: the namespace the output should use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RebindTarget {
    Localhost,
    #[default]
    Production,
}

impl RebindTarget {
    #[must_use]
    pub const fn site(self) -> Site {
        match self {
            Self::Localhost => Site::Localhost,
            Self::Production => Site::Production,
        }
    }

    #[must_use]
    pub const fn source(self) -> Site {
        match self {
            Self::Localhost => Site::Production,
            Self::Production => Site::Localhost,
        }
    }
}

impl FromStr for RebindTarget {
    type Err = RebindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "localhost" => Ok(Self::Localhost),
            "production" => Ok(Self::Production),
            _ => Err(RebindError::InvalidTarget(s.to_string())),
        }
    }
}

impl fmt::Display for RebindTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Localhost => "localhost".fmt(f),
            Self::Production => "production".fmt(f),
        }
    }
}

/// Rewrites one direction. Matching is a single left-to-right pass where the
/// longest source prefix wins, so output is never rewritten twice.
#[derive(Clone, Debug)]
pub struct IriRebinder {
    pattern: Option<Regex>,
    replacements: HashMap<String, String>,
}

impl IriRebinder {
    /// # Errors
    ///
    /// Fails only when the combined pattern exceeds the regex size limit.
    pub fn new(registry: &OntologyRegistry, target: RebindTarget) -> Result<Self, regex::Error> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for entry in registry.list() {
            pairs.push((
                entry.prefix_for(target.source()).to_string(),
                entry.prefix_for(target.site()).to_string(),
            ));
        }
        for (localhost, production) in registry.context_pairs() {
            let pair = match target {
                RebindTarget::Production => (localhost.clone(), production.clone()),
                RebindTarget::Localhost => (production.clone(), localhost.clone()),
            };
            pairs.push(pair);
        }
        Self::from_pairs(pairs)
    }

    fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, regex::Error> {
        let mut replacements = HashMap::with_capacity(pairs.len());
        for (source, replacement) in pairs {
            if source != replacement {
                replacements.entry(source).or_insert(replacement);
            }
        }

        let mut sources: Vec<&String> = replacements.keys().collect();
        sources.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let pattern = if sources.is_empty() {
            None
        } else {
            let alternation = sources
                .iter()
                .map(|source| regex::escape(source))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&alternation)?)
        };

        Ok(Self {
            pattern,
            replacements,
        })
    }

    #[must_use]
    pub fn rebind(&self, content: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return content.to_string();
        };
        pattern
            .replace_all(content, |caps: &Captures<'_>| {
                let matched = &caps[0];
                self.replacements
                    .get(matched)
                    .cloned()
                    .unwrap_or_else(|| matched.to_string())
            })
            .into_owned()
    }
}

/// Rebinders for both directions, built once per registry.
#[derive(Clone, Debug)]
pub struct Rebinders {
    localhost: IriRebinder,
    production: IriRebinder,
}

impl Rebinders {
    /// # Errors
    ///
    /// See [`IriRebinder::new`].
    pub fn new(registry: &OntologyRegistry) -> Result<Self, regex::Error> {
        Ok(Self {
            localhost: IriRebinder::new(registry, RebindTarget::Localhost)?,
            production: IriRebinder::new(registry, RebindTarget::Production)?,
        })
    }

    #[must_use]
    pub const fn get(&self, target: RebindTarget) -> &IriRebinder {
        match target {
            RebindTarget::Localhost => &self.localhost,
            RebindTarget::Production => &self.production,
        }
    }

    #[must_use]
    pub fn rebind(&self, content: &str, target: RebindTarget) -> String {
        self.get(target).rebind(content)
    }
}
