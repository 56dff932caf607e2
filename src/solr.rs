//! Blocking HTTP transport to a Solr server.
//!
//! Mutations are `POST {server}/update` with an XML body; queries are
//! `GET {server}/select`. Write failures are reported on stderr and dropped:
//! the index is eventually repaired by the next save or a reindex.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use solr_bridge_core::backend::IndexBackend;
use solr_bridge_core::wire::SelectParams;

use crate::config::SolrConfig;

pub struct SolrClient {
    client: Client,
    server: String,
}

impl SolrClient {
    pub fn new(config: &SolrConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            server: config.server.trim_end_matches('/').to_string(),
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Whether the server answers its ping handler.
    pub fn ping(&self) -> bool {
        let url = format!("{}/admin/ping?wt=json", self.server);
        match self.client.get(&url).send() {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

/// `{server}/select` with encoded pairs followed by the raw extras.
pub fn select_url(server: &str, params: &SelectParams) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/select", server))
        .with_context(|| format!("Invalid Solr server URL: {}", server))?;
    url.query_pairs_mut()
        .extend_pairs(params.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if !params.raw.is_empty() {
        let mut query = url.query().unwrap_or_default().to_string();
        for raw in &params.raw {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(raw);
        }
        url.set_query(Some(&query));
    }
    Ok(url)
}

impl IndexBackend for SolrClient {
    fn update(&self, xml: &str) {
        let url = format!("{}/update", self.server);
        let result = self
            .client
            .post(&url)
            .header("Content-Type", "text/xml")
            .body(xml.to_string())
            .send();
        match result {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().unwrap_or_default();
                eprintln!(
                    "Warning: Solr update returned {}: {}",
                    status,
                    body.chars().take(200).collect::<String>()
                );
            }
            Err(e) => eprintln!("Warning: Solr update failed: {}", e),
        }
    }

    fn select(&self, params: &SelectParams) -> Option<String> {
        let url = match select_url(&self.server, params) {
            Ok(url) => url,
            Err(e) => {
                eprintln!("Warning: {:#}", e);
                return None;
            }
        };
        match self.client.get(url).send() {
            Ok(resp) if resp.status().is_success() => resp.text().ok(),
            Ok(resp) => {
                eprintln!("Warning: Solr select returned {}", resp.status());
                None
            }
            Err(e) => {
                eprintln!("Warning: Solr select failed: {}", e);
                None
            }
        }
    }
}
