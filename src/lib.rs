//! # solr-bridge
//!
//! Bridges an object store to a Solr search server: projects objects into
//! search documents, keeps the index in step with single-object changes,
//! translates searches back into object references, generates the Solr
//! schema from per-class field configuration, and runs resumable bulk
//! reindexes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │ Object store │──▶│  Projector   │──▶│   Solr   │
//! │  + fields    │   │ + extractors │   │ /update  │
//! └──────────────┘   └──────────────┘   └────┬─────┘
//!                                            │
//!        ┌───────────────────────────────────┤
//!        ▼                                   ▼
//!  ┌────────────┐                     ┌────────────┐
//!  │  Reindex   │                     │   Query    │
//!  │ coordinator│                     │ translator │
//!  └────────────┘                     └────────────┘
//! ```
//!
//! The pure logic lives in `solr-bridge-core`; this crate adds the HTTP
//! transport, file extractors, cursor persistence, and the CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`solr`] | Blocking Solr HTTP client |
//! | [`extract`] | PDF, OOXML, plain-text and external-utility extractors |
//! | [`cursor`] | Reindex cursor persistence |
//! | [`progress`] | Reindex progress reporting |
//! | [`commands`] | CLI command implementations |
//! | [`diagnose`] | Diagnostics report |

pub mod commands;
pub mod config;
pub mod cursor;
pub mod diagnose;
pub mod extract;
pub mod progress;
pub mod solr;
