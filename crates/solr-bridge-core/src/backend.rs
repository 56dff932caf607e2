//! The index backend seam and the commit-aware [`Indexer`].
//!
//! [`IndexBackend`] is the transport: it posts mutation payloads and runs
//! select requests. All writes are best-effort; implementations report
//! failures themselves and never return them. Reads degrade to `None`.

use crate::document::{IndexDocument, Projector};
use crate::entity::{Entity, ObjectId, ObjectRef};
use crate::wire::{self, SelectParams};

/// Mutation and query transport to a Solr-style backend.
pub trait IndexBackend {
    /// POST an update payload.
    fn update(&self, xml: &str);

    /// Run a select request and return the raw response body.
    fn select(&self, params: &SelectParams) -> Option<String>;

    /// Add a document, replacing any with the same id.
    fn add_or_replace(&self, doc: &IndexDocument) {
        self.update(&wire::add(doc));
    }

    fn delete(&self, object: &ObjectRef) {
        self.update(&wire::delete(object));
    }

    /// Delete every document.
    fn wipe(&self) {
        self.update(wire::WIPE);
    }

    fn commit(&self) {
        self.update(wire::COMMIT);
    }

    fn optimize(&self) {
        self.update(wire::OPTIMIZE);
    }

    /// Documents in the index; 0 when the backend cannot be read.
    fn count(&self) -> u64 {
        self.select(&SelectParams::count())
            .and_then(|body| crate::query::decode_num_found(&body))
            .unwrap_or(0)
    }
}

/// Whether a mutation is committed right away or left for a later
/// [`Indexer::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Single-item changes from the host: commit after the mutation.
    Immediate,
    /// Bulk work: the caller commits once at the end.
    Deferred,
}

/// Projects objects and sends them to a backend.
pub struct Indexer<'a> {
    backend: &'a dyn IndexBackend,
    projector: Projector<'a>,
}

impl<'a> Indexer<'a> {
    pub fn new(backend: &'a dyn IndexBackend, projector: Projector<'a>) -> Self {
        Self { backend, projector }
    }

    pub fn backend(&self) -> &'a dyn IndexBackend {
        self.backend
    }

    pub fn projector(&self) -> &Projector<'a> {
        &self.projector
    }

    /// Index one object. Returns `false` (and sends nothing) when its class
    /// is not searchable.
    pub fn index(&self, entity: &dyn Entity, mode: CommitMode) -> bool {
        if !self.projector.registry().is_searchable(entity.class_name()) {
            return false;
        }
        let doc = self.projector.project(entity);
        self.backend.add_or_replace(&doc);
        self.finish(mode);
        true
    }

    pub fn remove(&self, class_name: &str, id: ObjectId, mode: CommitMode) {
        self.backend.delete(&ObjectRef::new(class_name, id));
        self.finish(mode);
    }

    pub fn wipe(&self, mode: CommitMode) {
        self.backend.wipe();
        self.finish(mode);
    }

    pub fn commit(&self) {
        self.backend.commit();
    }

    pub fn optimize(&self) {
        self.backend.optimize();
    }

    pub fn count(&self) -> u64 {
        self.backend.count()
    }

    fn finish(&self, mode: CommitMode) {
        if mode == CommitMode::Immediate {
            self.backend.commit();
        }
    }
}
