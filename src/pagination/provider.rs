//! Content provider backed by a content query
//!
//! Runs a caller-supplied query with the list's paging window as variables
//! (`listId`, `start`, `pageSize`) and reads `{ items, hasMore }` from the
//! named field of the result.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::ContentProvider;
use crate::client::{ContentClient, GraphQlRequest};
use crate::models::ContentList;
use crate::types::{PortalError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    has_more: bool,
}

/// Populates dynamic lists through a request's content client
pub struct QueryListProvider<'a> {
    client: &'a ContentClient,
    query: String,
    field: String,
}

impl<'a> QueryListProvider<'a> {
    pub fn new(
        client: &'a ContentClient,
        query: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            client,
            query: query.into(),
            field: field.into(),
        }
    }
}

#[async_trait]
impl<'a, T> ContentProvider<T> for QueryListProvider<'a>
where
    T: DeserializeOwned + Send,
{
    async fn populate_dynamic_list(&self, list: &mut ContentList<T>) -> Result<()> {
        let failed = |reason: String| PortalError::Population {
            list_id: list.id.clone(),
            reason,
        };

        let request = GraphQlRequest::new(self.query.clone())
            .variable("listId", list.id.clone())
            .variable("start", list.start)
            .variable("pageSize", list.effective_page_size());

        let mut data: serde_json::Map<String, serde_json::Value> = self
            .client
            .execute(&request)
            .await
            .map_err(|e| failed(e.to_string()))?;

        let page = data
            .remove(&self.field)
            .ok_or_else(|| failed(format!("result has no '{}' field", self.field)))?;
        let page: ListPage<T> = serde_json::from_value(page)
            .map_err(|e| failed(format!("unexpected list shape: {}", e)))?;

        debug!(
            list = %list.id,
            items = page.items.len(),
            has_more = page.has_more,
            "List page fetched"
        );

        list.items = page.items;
        list.has_more = page.has_more;
        Ok(())
    }
}
