//! Blocking SPARQL client for a GraphDB repository.

use std::fmt;
use std::time::Duration;

use pq_core::search::{SelectResults, SparqlExecutor};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;

use crate::config::EndpointConfig;
use crate::error::{ClientError, Result};

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Query used to check the store is up and answering.
pub const PROBE_QUERY: &str = "SELECT (COUNT(*) AS ?count) WHERE { ?s ?p ?o } LIMIT 1";

pub struct GraphDbClient {
    http: Client,
    endpoint_url: String,
    repository: String,
}

impl GraphDbClient {
    pub fn new(endpoint_url: impl Into<String>, repository: impl Into<String>) -> Result<Self> {
        Self::build(endpoint_url.into(), repository.into(), None)
    }

    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        Self::build(
            config.url.clone(),
            config.repository.clone(),
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    fn build(endpoint_url: String, repository: String, timeout: Option<Duration>) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint_url,
            repository,
        })
    }

    /// `{endpoint}/repositories/{repository}`.
    pub fn query_url(&self) -> String {
        query_url(&self.endpoint_url, &self.repository)
    }

    /// Total triple count, via the probe query.
    pub fn count_triples(&self) -> Result<u64> {
        parse_count(&self.post(PROBE_QUERY)?)
    }

    fn post(&self, query: &str) -> Result<SelectResults> {
        let response = self
            .http
            .post(self.query_url())
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", query)])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16(), body));
        }
        decode(&body)
    }
}

impl fmt::Debug for GraphDbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphDbClient")
            .field("endpoint_url", &self.endpoint_url)
            .field("repository", &self.repository)
            .finish()
    }
}

impl SparqlExecutor for GraphDbClient {
    type Error = ClientError;

    fn ping(&self) -> Result<()> {
        let count = self.count_triples()?;
        tracing::info!("connected to {}, {count} triples", self.query_url());
        Ok(())
    }

    fn select(&self, query: &str) -> Result<SelectResults> {
        self.post(query)
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

fn query_url(endpoint_url: &str, repository: &str) -> String {
    format!(
        "{}/repositories/{}",
        endpoint_url.trim_end_matches('/'),
        repository.trim_matches('/')
    )
}

fn decode(body: &str) -> Result<SelectResults> {
    Ok(serde_json::from_str(body)?)
}

fn parse_count(results: &SelectResults) -> Result<u64> {
    let row = results
        .results
        .bindings
        .first()
        .ok_or_else(|| ClientError::InvalidData("probe returned no rows".into()))?;
    let term = row
        .get("count")
        .ok_or_else(|| ClientError::InvalidData("probe row has no count".into()))?;
    term.value
        .trim()
        .parse()
        .map_err(|_| ClientError::InvalidData(format!("non-numeric count: {}", term.value)))
}
