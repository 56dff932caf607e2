//! CLI command implementations.
//!
//! Every command works against a [`Bridge`]: the loaded configuration, the
//! object store, the field registry, the extractor chain, and the Solr
//! client. Core components borrow from it for the duration of one command.

pub mod index;
pub mod reindex;
pub mod schema;
pub mod search;

use anyhow::{Context, Result};
use solr_bridge_core::backend::Indexer;
use solr_bridge_core::document::Projector;
use solr_bridge_core::extract::ExtractorChain;
use solr_bridge_core::fields::FieldRegistry;
use solr_bridge_core::query::QueryTranslator;
use solr_bridge_core::store::memory::MemoryStore;
use std::path::Path;

use crate::config::Config;
use crate::extract::build_chain;
use crate::solr::SolrClient;

pub struct Bridge {
    pub config: Config,
    pub store: MemoryStore,
    pub registry: FieldRegistry,
    pub extractors: ExtractorChain,
    pub client: SolrClient,
}

impl Bridge {
    pub fn open(config: Config) -> Result<Self> {
        let store = load_store(&config.store.path)?;
        let registry = config.field_registry()?;
        let extractors = build_chain(&config.extractors);
        let client = SolrClient::new(&config.solr)?;
        Ok(Self {
            config,
            store,
            registry,
            extractors,
            client,
        })
    }

    pub fn projector(&self) -> Projector<'_> {
        let projector = Projector::new(&self.registry, &self.extractors);
        match &self.config.store.assets_root {
            Some(root) => projector.with_assets_root(root),
            None => projector,
        }
    }

    pub fn indexer(&self) -> Indexer<'_> {
        Indexer::new(&self.client, self.projector())
    }

    pub fn translator(&self) -> QueryTranslator<'_> {
        QueryTranslator::new(&self.client, &self.store)
            .with_default_query(&self.config.solr.default_query)
            .with_rows(self.config.solr.rows)
    }
}

/// Load the object store fixture.
pub fn load_store(path: &Path) -> Result<MemoryStore> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read object store: {}", path.display()))?;
    MemoryStore::from_json(&content)
        .with_context(|| format!("Failed to load object store: {}", path.display()))
}
