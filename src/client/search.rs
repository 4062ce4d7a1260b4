//! Search client
//!
//! Generic over the result-set and result shapes so callers can map search
//! hits straight onto their own view models.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::header;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::Authenticator;
use crate::endpoint::ServiceEndpoint;
use crate::types::{PortalError, Result};

/// A single search hit
pub trait SearchResult: DeserializeOwned + Send {}

/// A page of search hits
pub trait SearchResultSet<R: SearchResult>: DeserializeOwned + Send {
    fn results(&self) -> &[R];

    /// Total number of hits across all pages
    fn total(&self) -> u64;
}

/// Generic search hit: identifier plus raw indexed fields
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    pub id: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl SearchResult for SearchHit {}

/// Generic result set
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults<R> {
    #[serde(default = "Vec::new")]
    pub hits: Vec<R>,
    #[serde(default)]
    pub total: u64,
}

impl<R: SearchResult> SearchResultSet<R> for SearchResults<R> {
    fn results(&self) -> &[R] {
        &self.hits
    }

    fn total(&self) -> u64 {
        self.total
    }
}

/// Search request
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub terms: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub filters: HashMap<String, String>,
    pub start: u32,
    pub page_size: u32,
}

impl SearchQuery {
    pub fn new(terms: impl Into<String>) -> Self {
        Self {
            terms: terms.into(),
            page_size: 10,
            ..Default::default()
        }
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn page(mut self, start: u32, page_size: u32) -> Self {
        self.start = start;
        self.page_size = page_size;
        self
    }
}

/// Client bound to the search endpoint
pub struct SearchClient<RS, R> {
    endpoint: ServiceEndpoint,
    http: reqwest::Client,
    auth: Arc<dyn Authenticator>,
    _shape: PhantomData<fn() -> (RS, R)>,
}

impl<RS, R> SearchClient<RS, R>
where
    RS: SearchResultSet<R>,
    R: SearchResult,
{
    pub(crate) fn new(
        endpoint: ServiceEndpoint,
        http: reqwest::Client,
        auth: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            endpoint,
            http,
            auth,
            _shape: PhantomData,
        }
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.endpoint.uri.as_str().trim_end_matches('/'))
    }

    /// Run a search query
    pub async fn search(&self, query: &SearchQuery) -> Result<RS> {
        let url = self.search_url();
        debug!(url = %url, terms = %query.terms, start = query.start, "Executing search");

        let mut builder = self.http.post(&url).json(query);
        if let Some(authorization) = self.auth.authorization().await? {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(PortalError::Server { status, message });
        }

        Ok(response.json().await?)
    }
}
