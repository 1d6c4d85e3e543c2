//! Ontology namespace domain.
//!
//! The registry describes which namespaces exist. The safety validator and
//! the rebinder are pure functions over a registry snapshot and never touch
//! the graph store.

pub mod rebind;
pub mod registry;
pub mod safety;
pub mod value_objects;

pub use rebind::{IriRebinder, RebindError, RebindTarget, Rebinders};
pub use registry::{OntologyEntry, OntologyRegistry, RegistryError, Site, SiteConfig};
pub use safety::{IriSafetyReport, IriSafetyValidator, SafetyPolicy};
pub use value_objects::{Iri, IriError};
