//! Web search provider seam and the Tavily implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    Decode(String),
}

/// One ranked search result.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchHit {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub url: String,
}

/// External web search capability.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return at most `max_results` hits, best first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

/// Tavily search API client.
pub struct TavilyClient {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
    timeout: Duration,
}

impl TavilyClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.tavily_api_key.clone(),
            api_url: TAVILY_API_URL.to_string(),
            timeout: config.request_timeout,
        }
    }

    /// Point the client at another Tavily-compatible endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&TavilyRequest {
                query,
                search_depth: "advanced",
                max_results,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        let mut hits = parsed.results;
        hits.truncate(max_results);
        Ok(hits)
    }
}
