//! RDF serialization formats accepted and produced over HTTP.

use std::path::Path;

use oxrdf::{Graph, TripleRef};
use oxrdfio::{RdfFormat as OxRdfFormat, RdfParser, RdfSerializer};

use super::StoreError;

const JSON_LD_MEDIA_TYPE: &str = "application/ld+json";

/// Wire formats. Turtle is the fallback wherever a format cannot be
/// determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RdfFormat {
    #[default]
    Turtle,
    JsonLd,
    RdfXml,
}

impl RdfFormat {
    #[must_use]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::Turtle => "text/turtle",
            Self::JsonLd => JSON_LD_MEDIA_TYPE,
            Self::RdfXml => "application/rdf+xml",
        }
    }

    /// `Content-Type` header value for responses.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Turtle => "text/turtle; charset=utf-8",
            Self::JsonLd => "application/ld+json; charset=utf-8",
            Self::RdfXml => "application/rdf+xml; charset=utf-8",
        }
    }

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Turtle => "turtle",
            Self::JsonLd => "jsonld",
            Self::RdfXml => "rdfxml",
        }
    }

    /// Maps a `format` parameter. Unknown or empty ids fall back to Turtle.
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "jsonld" | "json-ld" => Self::JsonLd,
            "rdfxml" | "rdf-xml" | "xml" => Self::RdfXml,
            _ => Self::Turtle,
        }
    }

    /// Recognises a bare media type (no parameters), case-insensitively.
    #[must_use]
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type.trim().to_ascii_lowercase().as_str() {
            "application/ld+json" | "application/json" => Some(Self::JsonLd),
            "text/turtle" | "application/x-turtle" | "text/plain" => Some(Self::Turtle),
            "application/rdf+xml" | "application/xml" | "text/xml" => Some(Self::RdfXml),
            _ => None,
        }
    }

    /// Format of a request body from its `Content-Type`. Parameters such as
    /// `charset` are ignored; anything unrecognised is Turtle.
    #[must_use]
    pub fn from_content_type(header: Option<&str>) -> Self {
        header
            .map(essence)
            .and_then(Self::from_media_type)
            .unwrap_or_default()
    }

    /// First media range of an `Accept` header that names a known format.
    #[must_use]
    pub fn from_accept(header: &str) -> Option<Self> {
        header
            .split(',')
            .map(essence)
            .find_map(Self::from_media_type)
    }

    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "ttl" | "turtle" => Some(Self::Turtle),
            "jsonld" | "json" => Some(Self::JsonLd),
            "rdf" | "owl" | "xml" => Some(Self::RdfXml),
            _ => None,
        }
    }

    fn to_oxrdf_format(self) -> Result<OxRdfFormat, StoreError> {
        match self {
            Self::Turtle => Ok(OxRdfFormat::Turtle),
            Self::RdfXml => Ok(OxRdfFormat::RdfXml),
            Self::JsonLd => OxRdfFormat::from_media_type(JSON_LD_MEDIA_TYPE)
                .ok_or(StoreError::UnsupportedFormat(JSON_LD_MEDIA_TYPE)),
        }
    }
}

/// `type/subtype` of a media type, without parameters.
fn essence(value: &str) -> &str {
    value.split(';').next().unwrap_or_default().trim()
}

/// Parses `input` into a scratch graph. Quads in named graphs are folded into
/// it as triples.
///
/// # Errors
///
/// Returns [`StoreError::Parse`] for syntax errors or an invalid base IRI.
pub fn parse_graph(input: &[u8], format: RdfFormat, base: Option<&str>) -> Result<Graph, StoreError> {
    let mut parser = RdfParser::from_format(format.to_oxrdf_format()?);
    if let Some(base_iri) = base {
        parser = parser
            .with_base_iri(base_iri)
            .map_err(|e| StoreError::Parse(format!("invalid base IRI: {e}")))?;
    }

    let mut graph = Graph::new();
    for quad in parser.for_reader(input) {
        let quad = quad.map_err(|e| StoreError::Parse(e.to_string()))?;
        graph.insert(TripleRef::new(&quad.subject, &quad.predicate, &quad.object));
    }
    Ok(graph)
}

/// Parses `input` into the distinct triples it states.
///
/// # Errors
///
/// Returns [`StoreError::Parse`] for syntax errors or an invalid base IRI.
pub fn parse_triples(
    input: &[u8],
    format: RdfFormat,
    base: Option<&str>,
) -> Result<Vec<oxrdf::Triple>, StoreError> {
    Ok(parse_graph(input, format, base)?
        .iter()
        .map(TripleRef::into_owned)
        .collect())
}

/// Serializes triples in `format`.
///
/// # Errors
///
/// Returns [`StoreError::Serialize`] when the serializer fails.
pub fn serialize<'a>(
    triples: impl IntoIterator<Item = TripleRef<'a>>,
    format: RdfFormat,
) -> Result<Vec<u8>, StoreError> {
    let mut serializer = RdfSerializer::from_format(format.to_oxrdf_format()?).for_writer(Vec::new());
    for triple in triples {
        serializer
            .serialize_triple(triple)
            .map_err(|e: std::io::Error| StoreError::Serialize(e.to_string()))?;
    }
    serializer
        .finish()
        .map_err(|e: std::io::Error| StoreError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    const TURTLE: &str = "@prefix core: <http://localhost:8080/onto/core#> .\n\
                          core:A core:rel core:B .\ncore:B core:rel core:C .\n";

    #[test]
    fn content_type_is_parsed_as_media_type() {
        assert_eq!(RdfFormat::from_content_type(None), RdfFormat::Turtle);
        assert_eq!(
            RdfFormat::from_content_type(Some("application/ld+json; charset=UTF-8")),
            RdfFormat::JsonLd
        );
        assert_eq!(
            RdfFormat::from_content_type(Some("Application/RDF+XML")),
            RdfFormat::RdfXml
        );
        assert_eq!(
            RdfFormat::from_content_type(Some("text/plain;charset=utf-8")),
            RdfFormat::Turtle
        );
        // no substring sniffing
        assert_eq!(
            RdfFormat::from_content_type(Some("text/x-not-json")),
            RdfFormat::Turtle
        );
    }

    #[test]
    fn ids_and_accept_headers() {
        assert_eq!(RdfFormat::from_id("json-ld"), RdfFormat::JsonLd);
        assert_eq!(RdfFormat::from_id("XML"), RdfFormat::RdfXml);
        assert_eq!(RdfFormat::from_id("ttl"), RdfFormat::Turtle);
        assert_eq!(RdfFormat::from_id("n3"), RdfFormat::Turtle);
        assert_eq!(
            RdfFormat::from_accept("text/html, application/ld+json;q=0.9"),
            Some(RdfFormat::JsonLd)
        );
        assert_eq!(RdfFormat::from_accept("*/*"), None);
    }

    #[test]
    fn extensions() {
        assert_eq!(
            RdfFormat::from_extension(Path::new("ontology/core.TTL")),
            Some(RdfFormat::Turtle)
        );
        assert_eq!(
            RdfFormat::from_extension(Path::new("context.jsonld")),
            Some(RdfFormat::JsonLd)
        );
        assert_eq!(RdfFormat::from_extension(Path::new("notes.md")), None);
    }

    #[test]
    fn parses_and_serializes_turtle() {
        let graph = parse_graph(TURTLE.as_bytes(), RdfFormat::Turtle, None).expect("parse");
        assert_eq!(graph.len(), 2);

        let bytes = serialize(graph.iter(), RdfFormat::Turtle).expect("serialize");
        let reparsed = parse_graph(&bytes, RdfFormat::Turtle, None).expect("reparse");
        assert_eq!(reparsed, graph);
    }

    #[test]
    fn resolves_relative_iris_against_base() {
        let graph = parse_graph(
            b"<A> <rel> <B> .",
            RdfFormat::Turtle,
            Some("http://localhost:8080/onto/"),
        )
        .expect("parse");
        let triple = graph.iter().next().expect("one triple");
        assert_eq!(
            triple.subject.to_string(),
            "<http://localhost:8080/onto/A>"
        );
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        let err = parse_graph(b"<A> <rel> .", RdfFormat::Turtle, None).expect_err("malformed");
        assert!(matches!(err, StoreError::Parse(_)));
    }
}
