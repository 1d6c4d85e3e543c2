//! IRI safety checks for untrusted JSON-LD.
//!
//! Payloads are inspected as plain JSON, never as RDF, so hostile documents
//! are refused before any graph is built from them. The checks:
//!
//! * every `@base`, top-level or nested, must be one of the registered
//!   namespace prefixes;
//! * without `@base`, the document must not rely on relative `@id`s;
//! * relative `@id`s resolve against the `@base` in scope and must stay in
//!   its directory;
//! * every absolute IRI in `@id` values and in `@context` must belong to an
//!   allowed namespace family.
//!
//! All problems are collected; the scan never stops at the first one.

use std::collections::HashMap;

use oxiri::Iri;
use serde::Serialize;
use serde_json::{Map, Value};

use super::registry::OntologyRegistry;
use crate::config;

pub const INVALID_JSON: &str = "invalid_json";
pub const BASE_IRI_NOT_REGISTERED: &str = "base_iri_not_registered";
pub const MISSING_BASE_IRI: &str = "missing_base_iri";
pub const IRI_NOT_ALLOWED: &str = "iri_not_allowed";

/// Outcome of validating one payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IriSafetyReport {
    pub ok: bool,
    pub base_iri: Option<String>,
    pub errors: Vec<String>,
}

impl IriSafetyReport {
    fn new(base_iri: Option<String>, errors: Vec<String>) -> Self {
        Self {
            ok: errors.is_empty(),
            base_iri,
            errors,
        }
    }
}

/// External vocabularies payloads may reference on top of the registry.
#[derive(Clone, Debug)]
pub struct SafetyPolicy {
    allowed_external_prefixes: Vec<String>,
}

impl SafetyPolicy {
    #[must_use]
    pub fn new(allowed_external_prefixes: Vec<String>) -> Self {
        Self {
            allowed_external_prefixes,
        }
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        config::Validation::default().into()
    }
}

impl From<config::Validation> for SafetyPolicy {
    fn from(config: config::Validation) -> Self {
        Self::new(config.allowed_external_prefixes)
    }
}

pub struct IriSafetyValidator<'a> {
    registry: &'a OntologyRegistry,
    policy: &'a SafetyPolicy,
}

impl<'a> IriSafetyValidator<'a> {
    #[must_use]
    pub fn new(registry: &'a OntologyRegistry, policy: &'a SafetyPolicy) -> Self {
        Self { registry, policy }
    }

    /// Validates a JSON-LD payload. Pure: reads only the payload and the
    /// registry.
    #[must_use]
    pub fn validate(&self, payload: &[u8]) -> IriSafetyReport {
        let document: Value = match serde_json::from_slice(payload) {
            Ok(document) => document,
            Err(err) => {
                return IriSafetyReport::new(None, vec![format!("{INVALID_JSON}: {err}")]);
            }
        };

        let base_iri = declared_base(&top_level_contexts(&document)).map(|base| match base {
            Value::String(base) => base.clone(),
            other => other.to_string(),
        });

        let mut scan = Scan::new(self);
        scan.walk(&document, &Scope::default());

        let mut errors = scan.base_errors;
        if scan.relies_on_missing_base {
            errors.push(MISSING_BASE_IRI.to_string());
        }
        errors.extend(scan.iri_errors);
        IriSafetyReport::new(base_iri, errors)
    }

    fn is_allowed(&self, iri: &str) -> bool {
        self.registry.prefixes().any(|prefix| iri == prefix.trimmed())
            || self
                .registry
                .namespace_families()
                .iter()
                .any(|family| iri.starts_with(family))
            || self
                .policy
                .allowed_external_prefixes
                .iter()
                .any(|prefix| iri.starts_with(prefix.as_str()))
    }
}

/// `@context` values of the document root, or of each root object when the
/// document is an array.
fn top_level_contexts(document: &Value) -> Vec<&Value> {
    let roots: Vec<&Value> = match document {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    roots
        .into_iter()
        .filter_map(|root| root.get("@context"))
        .collect()
}

/// Context objects in declaration order, flattening context arrays.
fn context_objects<'v>(contexts: &[&'v Value]) -> Vec<&'v Map<String, Value>> {
    let mut objects = Vec::new();
    for context in contexts {
        match context {
            Value::Object(map) => objects.push(map),
            Value::Array(items) => objects.extend(items.iter().filter_map(Value::as_object)),
            _ => {}
        }
    }
    objects
}

/// The first non-null `@base`.
fn declared_base<'v>(contexts: &[&'v Value]) -> Option<&'v Value> {
    context_objects(contexts)
        .into_iter()
        .filter_map(|map| map.get("@base"))
        .find(|base| !base.is_null())
}

/// The base relative references resolve against at some point of the
/// document.
#[derive(Clone, Debug, Default)]
enum BaseScope {
    #[default]
    Unset,
    Registered(String),
    /// Already reported; references under it are not checked again.
    Unregistered,
}

/// Active context while walking: the base in effect plus the terms usable
/// as compact IRI prefixes.
#[derive(Clone, Debug, Default)]
struct Scope {
    base: BaseScope,
    prefixes: HashMap<String, String>,
}

impl Scope {
    /// The scope of a node object carrying `context`.
    fn within(&self, context: &Value, registry: &OntologyRegistry) -> Self {
        let mut scope = self.clone();
        let entries: Vec<&Value> = match context {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for entry in entries {
            let map = match entry {
                Value::Null => {
                    scope = Self::default();
                    continue;
                }
                Value::Object(map) => map,
                _ => continue,
            };
            if let Some(base) = map.get("@base") {
                scope.base = match base {
                    Value::Null => BaseScope::Unset,
                    Value::String(base) if registry.is_registered_prefix(base) => {
                        BaseScope::Registered(base.clone())
                    }
                    _ => BaseScope::Unregistered,
                };
            }
            for (term, definition) in map {
                if term.starts_with('@') || term.contains(':') {
                    continue;
                }
                let iri = match definition {
                    Value::String(iri) => Some(iri.as_str()),
                    Value::Object(def) => def.get("@id").and_then(Value::as_str),
                    _ => None,
                };
                if let Some(iri) = iri.filter(|iri| !iri.starts_with('@')) {
                    scope.prefixes.insert(term.clone(), iri.to_string());
                }
            }
        }
        scope
    }
}

struct Scan<'v, 'a> {
    validator: &'v IriSafetyValidator<'a>,
    base_errors: Vec<String>,
    iri_errors: Vec<String>,
    relies_on_missing_base: bool,
}

impl<'v, 'a> Scan<'v, 'a> {
    fn new(validator: &'v IriSafetyValidator<'a>) -> Self {
        Self {
            validator,
            base_errors: Vec::new(),
            iri_errors: Vec::new(),
            relies_on_missing_base: false,
        }
    }

    fn walk(&mut self, value: &Value, scope: &Scope) {
        match value {
            Value::Array(items) => items.iter().for_each(|item| self.walk(item, scope)),
            Value::Object(map) => {
                let nested;
                let scope = match map.get("@context") {
                    Some(context) => {
                        self.check_context(context, scope);
                        nested = scope.within(context, self.validator.registry);
                        &nested
                    }
                    None => scope,
                };
                for (key, value) in map {
                    match (key.as_str(), value) {
                        ("@context", _) => {}
                        ("@id", Value::String(id)) => self.check_reference(id, scope, false),
                        _ => self.walk(value, scope),
                    }
                }
            }
            _ => {}
        }
    }

    /// Every `@base` at any depth, scoped contexts included, must be
    /// registered. Other strings are namespace-checked.
    fn check_context(&mut self, value: &Value, scope: &Scope) {
        match value {
            Value::String(s) if !s.starts_with('@') => self.check_reference(s, scope, true),
            Value::Array(items) => items.iter().for_each(|item| self.check_context(item, scope)),
            Value::Object(map) => {
                for (key, value) in map {
                    if key == "@base" {
                        self.check_base(value);
                    } else {
                        self.check_context(value, scope);
                    }
                }
            }
            _ => {}
        }
    }

    fn check_base(&mut self, base: &Value) {
        let rendered = match base {
            Value::Null => return,
            Value::String(base) if self.validator.registry.is_registered_prefix(base) => return,
            Value::String(base) => base.clone(),
            other => other.to_string(),
        };
        push_unique(
            &mut self.base_errors,
            format!("{BASE_IRI_NOT_REGISTERED}: {rendered}"),
        );
    }

    fn check_reference(&mut self, value: &str, scope: &Scope, in_context: bool) {
        if is_blank_node(value) {
            return;
        }
        if let Some(iri) = absolute_form(value, &scope.prefixes) {
            if !self.validator.is_allowed(&iri) {
                push_unique(&mut self.iri_errors, format!("{IRI_NOT_ALLOWED}: {iri}"));
            }
            return;
        }
        if !is_relative(value) {
            return;
        }
        match &scope.base {
            BaseScope::Registered(base) => self.check_resolved(base, value),
            BaseScope::Unregistered => {}
            BaseScope::Unset if value.starts_with("//") => {
                push_unique(&mut self.iri_errors, format!("{IRI_NOT_ALLOWED}: {value}"));
            }
            BaseScope::Unset if !in_context => self.relies_on_missing_base = true,
            BaseScope::Unset => {}
        }
    }

    /// A relative reference under a registered base must resolve into the
    /// base's directory or into an allowed namespace.
    fn check_resolved(&mut self, base: &str, reference: &str) {
        let resolved = Iri::parse(base).ok().and_then(|base| {
            let directory = base.resolve("./").ok()?;
            let resolved = base.resolve(reference).ok()?;
            Some((directory.into_inner(), resolved.into_inner()))
        });
        match resolved {
            Some((directory, resolved))
                if resolved.starts_with(&directory) || self.validator.is_allowed(&resolved) => {}
            Some((_, resolved)) => {
                push_unique(&mut self.iri_errors, format!("{IRI_NOT_ALLOWED}: {resolved}"));
            }
            None => {
                push_unique(&mut self.iri_errors, format!("{IRI_NOT_ALLOWED}: {reference}"));
            }
        }
    }
}

fn push_unique(errors: &mut Vec<String>, error: String) {
    if !errors.contains(&error) {
        errors.push(error);
    }
}

/// Splits off an RFC 3986 scheme (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`).
fn scheme(value: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = value.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    (first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')))
    .then_some((scheme, rest))
}

fn is_blank_node(value: &str) -> bool {
    value.starts_with("_:")
}

/// Relative reference: neither a blank node nor anything carrying a scheme or
/// compact-IRI prefix.
fn is_relative(value: &str) -> bool {
    !is_blank_node(value) && scheme(value).is_none()
}

/// The absolute http(s) IRI `value` denotes, expanding compact IRIs through
/// the document's prefixes. Other values are not namespace-checked.
fn absolute_form(value: &str, prefixes: &HashMap<String, String>) -> Option<String> {
    if is_blank_node(value) {
        return None;
    }
    let (scheme, rest) = scheme(value)?;
    if !rest.starts_with("//") {
        if let Some(expansion) = prefixes.get(scheme) {
            return absolute_form(&format!("{expansion}{rest}"), &HashMap::new());
        }
    }
    (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
        .then(|| value.to_string())
}
