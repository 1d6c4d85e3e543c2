use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use oxrdf::NamedNode;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Value object ensuring that supplied text is an absolute IRI usable as a
/// namespace prefix: `http` or `https` scheme, a non-empty host and no
/// whitespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri {
    value: String,
}

impl Iri {
    /// Validates and constructs a new [`Iri`] value object.
    ///
    /// # Errors
    ///
    /// Returns [`IriError`] describing the first rule the text breaks.
    pub fn new(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        if value.chars().any(char::is_whitespace) {
            return Err(IriError::Whitespace { value });
        }
        NamedNode::new(value.as_str()).map_err(|_| IriError::Invalid {
            value: value.clone(),
        })?;

        let Some((scheme, rest)) = value.split_once("://") else {
            return Err(IriError::UnsupportedScheme { value });
        };
        if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
            return Err(IriError::UnsupportedScheme { value });
        }
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let host = authority
            .rsplit_once('@')
            .map_or(authority, |(_, host)| host);
        let host = host.split(':').next().unwrap_or_default();
        if host.is_empty() {
            return Err(IriError::MissingHost { value });
        }

        Ok(Self { value })
    }

    /// Returns the underlying textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The prefix with one trailing `#` or `/` removed.
    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.value
            .strip_suffix('#')
            .or_else(|| self.value.strip_suffix('/'))
            .unwrap_or(&self.value)
    }

    /// Whether one of the two prefixes is equal to or nested in the other.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.value.starts_with(&other.value) || other.value.starts_with(&self.value)
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl Serialize for Iri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for Iri {
    type Error = IriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Errors produced when validating an [`Iri`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    /// The provided text could not be parsed as an IRI.
    #[error("invalid IRI: {value}")]
    Invalid { value: String },
    #[error("IRI contains whitespace: {value:?}")]
    Whitespace { value: String },
    #[error("IRI must use the http or https scheme: {value}")]
    UnsupportedScheme { value: String },
    #[error("IRI has no host: {value}")]
    MissingHost { value: String },
}

#[cfg(test)]
mod tests {
    use super::{Iri, IriError};

    #[test]
    fn accepts_valid_iri() {
        let iri = Iri::new("https://example.org/resource").expect("valid IRI");
        assert_eq!(iri.as_str(), "https://example.org/resource");
    }

    #[test]
    fn rejects_invalid_iri() {
        let err = Iri::new("not-an-iri").expect_err("invalid IRI");
        assert!(matches!(err, IriError::Invalid { value } if value == "not-an-iri"));
    }

    #[test]
    fn rejects_whitespace_and_foreign_schemes() {
        assert!(matches!(
            Iri::new("http://example.org/a b"),
            Err(IriError::Whitespace { .. })
        ));
        assert!(matches!(
            Iri::new("urn:isbn:0451450523"),
            Err(IriError::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            Iri::new("ftp://example.org/onto#"),
            Err(IriError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn accepts_ports_and_fragments() {
        let iri = Iri::new("http://localhost:8080/onto/core#").expect("valid IRI");
        assert_eq!(iri.trimmed(), "http://localhost:8080/onto/core");
    }

    #[test]
    fn detects_nested_prefixes() {
        let outer = Iri::new("https://example.org/onto/").expect("outer");
        let inner = Iri::new("https://example.org/onto/core#").expect("inner");
        let other = Iri::new("http://localhost:8080/onto/").expect("other");
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
        assert!(!outer.overlaps(&other));
    }
}
