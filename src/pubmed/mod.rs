pub mod types;

use std::env;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use types::{PaperRecord, extract_id_list, extract_summary};

const API_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const TOOL_NAME: &str = "pubmed-fetcher";

/// Characters to percent-encode in query parameter values.
/// Keeps PubMed search syntax (`[tiab]`, `AND`, quotes) readable while stopping
/// a term from terminating its own parameter.
const PARAM_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'=')
    .add(b'?');

#[derive(Debug, thiserror::Error)]
pub enum PubmedError {
    #[error("PubMed rate limit exceeded. Set NCBI_API_KEY for a higher limit.")]
    RateLimited,

    #[error("PubMed request failed: status {0}")]
    Status(u16),

    #[error("PubMed request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where papers come from: a term search followed by per-id summaries.
/// Implemented by `PubmedClient` for production; test doubles used in tests.
pub trait PaperSource {
    async fn search(&self, term: &str) -> Result<Vec<String>, PubmedError>;

    /// `Ok(None)` when the summary body has no usable record for `id`.
    async fn fetch_summary(&self, id: &str) -> Result<Option<PaperRecord>, PubmedError>;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// HTTP client for the NCBI E-utilities `esearch` and `esummary` endpoints.
#[derive(Clone, Debug)]
pub struct PubmedClient {
    http: Client,
    api_key: Option<ApiKey>,
    email: Option<String>,
    base_url: String,
    max_results: Option<u32>,
}

impl PubmedClient {
    /// Reads `NCBI_API_KEY`, `NCBI_EMAIL` and `PUBMED_BASE_URL`; all optional.
    pub fn from_env(http: Client) -> Self {
        let api_key = non_empty_var("NCBI_API_KEY").map(ApiKey);
        if api_key.is_some() {
            debug!("NCBI API key configured");
        }
        let base_url = non_empty_var("PUBMED_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| API_BASE.to_string());
        Self {
            http,
            api_key,
            email: non_empty_var("NCBI_EMAIL"),
            base_url,
            max_results: None,
        }
    }

    #[cfg(test)]
    fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: None,
            email: None,
            base_url: base_url.to_string(),
            max_results: None,
        }
    }

    /// Caps the number of ids a search returns (`retmax`). Still a single request.
    pub fn with_max_results(mut self, max_results: Option<u32>) -> Self {
        self.max_results = max_results;
        self
    }

    fn endpoint_url(&self, endpoint: &str, params: &str) -> String {
        let mut url = format!(
            "{}/{endpoint}?db=pubmed&{params}&retmode=json&tool={TOOL_NAME}",
            self.base_url
        );
        if let Some(ref email) = self.email {
            url.push_str(&format!("&email={}", encode_param(email)));
        }
        if let Some(ApiKey(ref key)) = self.api_key {
            url.push_str(&format!("&api_key={}", encode_param(key)));
        }
        url
    }

    async fn get_json(&self, url: &str) -> Result<Value, PubmedError> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("PubMed rate limited");
            return Err(PubmedError::RateLimited);
        }
        if !status.is_success() {
            warn!(status = %status, "PubMed returned non-success status");
            return Err(PubmedError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

impl PaperSource for PubmedClient {
    async fn search(&self, term: &str) -> Result<Vec<String>, PubmedError> {
        let mut params = format!("term={}", encode_param(term));
        if let Some(max) = self.max_results {
            params.push_str(&format!("&retmax={max}"));
        }
        let body = self
            .get_json(&self.endpoint_url("esearch.fcgi", &params))
            .await?;
        let ids = extract_id_list(&body);
        debug!(term, count = ids.len(), "search complete");
        Ok(ids)
    }

    async fn fetch_summary(&self, id: &str) -> Result<Option<PaperRecord>, PubmedError> {
        let params = format!("id={}", encode_param(id));
        let body = self
            .get_json(&self.endpoint_url("esummary.fcgi", &params))
            .await?;
        let record = extract_summary(&body, id);
        debug!(id, found = record.is_some(), "summary fetched");
        Ok(record)
    }
}

fn encode_param(s: &str) -> String {
    utf8_percent_encode(s, PARAM_ENCODE_SET).to_string()
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
