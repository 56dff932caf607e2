//! # solr-bridge core
//!
//! Pure logic for bridging an object graph to a Solr-style search backend:
//! value model, field configuration, document projection, wire codec, query
//! translation, schema generation, and the resumable reindex coordinator.
//!
//! This crate performs no network, filesystem, or process I/O of its own.
//! The host object store, the HTTP transport, and binary text extraction are
//! reached only through the [`entity::ObjectStore`], [`backend::IndexBackend`],
//! and [`extract::TextExtractor`] traits.

pub mod backend;
pub mod document;
pub mod entity;
pub mod extract;
pub mod fields;
pub mod filters;
pub mod query;
pub mod reindex;
pub mod resolve;
pub mod schema;
pub mod store;
pub mod value;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;
