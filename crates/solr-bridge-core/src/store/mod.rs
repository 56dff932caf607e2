//! Object store implementations.
//!
//! The bridge only needs the [`ObjectStore`](crate::entity::ObjectStore)
//! trait; hosts plug in their own. [`memory::MemoryStore`] is the reference
//! implementation used by tests and by the CLI's fixture-backed store.

pub mod memory;
