//! Fixtures shared by unit and integration tests: a throwaway ontology
//! repository on disk, a matching configuration and a ready context.

pub mod app;
pub mod config;
pub mod repo;
