use anyhow::{Context, Result};
use serde::Deserialize;
use solr_bridge_core::fields::{FieldRegistry, FieldSpec};
use solr_bridge_core::query::{DEFAULT_QUERY, DEFAULT_ROWS};
use solr_bridge_core::reindex::DEFAULT_PAGE_SIZE;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub solr: SolrConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub reindex: ReindexConfig,
    #[serde(default)]
    pub extractors: ExtractorsConfig,
    /// Searchable classes. Enumerated in name order.
    #[serde(default)]
    pub classes: BTreeMap<String, ClassConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SolrConfig {
    pub server: String,
    #[serde(default = "default_query")]
    pub default_query: String,
    #[serde(default = "default_rows")]
    pub rows: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_query() -> String {
    DEFAULT_QUERY.to_string()
}
fn default_rows() -> u64 {
    DEFAULT_ROWS
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// JSON fixture backing the object store.
    pub path: PathBuf,
    #[serde(default)]
    pub assets_root: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReindexConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_cursor_path")]
    pub cursor_path: PathBuf,
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            cursor_path: default_cursor_path(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_cursor_path() -> PathBuf {
    PathBuf::from("./data/reindex-cursor.json")
}

/// Paths to optional external extraction utilities.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExtractorsConfig {
    #[serde(default)]
    pub pdftotext: Option<PathBuf>,
    #[serde(default)]
    pub catdoc: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClassConfig {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl Config {
    /// Register every configured class.
    pub fn field_registry(&self) -> Result<FieldRegistry> {
        let mut registry = FieldRegistry::new();
        for (class_name, class) in &self.classes {
            registry
                .register(class_name, class.fields.iter().cloned())
                .with_context(|| format!("Invalid field configuration for class '{}'", class_name))?;
        }
        Ok(registry)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.solr.server.trim().is_empty() {
        anyhow::bail!("solr.server must not be empty");
    }
    if config.solr.rows == 0 {
        anyhow::bail!("solr.rows must be > 0");
    }
    if config.reindex.page_size == 0 {
        anyhow::bail!("reindex.page_size must be > 0");
    }

    // Unknown content filters surface here rather than mid-reindex.
    config.field_registry()?;

    Ok(config)
}
