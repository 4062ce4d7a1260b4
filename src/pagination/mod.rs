//! Dynamic list pagination
//!
//! Decides, once per render pass, whether a dynamic list is populated from
//! the backend and from which offset.
//!
//! ## States
//!
//! ```text
//! Empty ──(items empty && request id == list id)──> Populating ──> Populated
//! ```
//!
//! A list that already has items, or whose query has been issued, is never
//! queried again in the same pass, even when the page came back empty. The
//! `id` check keeps a `start` parameter meant for one list from paging a
//! sibling list rendered on the same page.

mod provider;

pub use provider::QueryListProvider;

pub use crate::models::ListState;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::models::ContentList;
use crate::types::Result;

impl ListState {
    pub fn of<T>(list: &ContentList<T>) -> Self {
        list.state()
    }
}

/// Paging parameters from the inbound request's query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaginationParams {
    /// Identifier of the list the paging link was generated for
    #[serde(default)]
    pub id: Option<String>,
    /// Item offset, kept raw so unparseable values fall back to 0
    #[serde(default)]
    pub start: Option<String>,
}

impl PaginationParams {
    pub fn new(id: impl Into<String>, start: u32) -> Self {
        Self {
            id: Some(id.into()),
            start: Some(start.to_string()),
        }
    }

    /// Parse from a raw query string (`id=tcm:1-2&start=40`)
    pub fn from_query(query: &str) -> Result<Self> {
        Ok(serde_urlencoded::from_str(query)?)
    }

    /// Requested offset; missing, negative or malformed values give 0
    pub fn start_offset(&self) -> u32 {
        self.start
            .as_deref()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(0)
    }

    /// Whether these parameters were issued for the given list
    pub fn targets(&self, list_id: &str) -> bool {
        self.id.as_deref() == Some(list_id)
    }
}

/// Fills a dynamic list with the items of its current page
#[async_trait]
pub trait ContentProvider<T: Send>: Send + Sync {
    /// Populate `list.items` for `list.page_range()`
    async fn populate_dynamic_list(&self, list: &mut ContentList<T>) -> Result<()>;
}

/// Applies the paging rules to dynamic lists
pub struct ListPaginationEngine<P> {
    provider: P,
}

impl<P> ListPaginationEngine<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Populate the list for this render pass if the request targets it.
    ///
    /// Returns the list's state afterwards. Provider failures are returned
    /// as-is; paging fields set before the call are left in place and the
    /// list stays `Populating`, so it is not queried again in this pass.
    pub async fn enrich<T>(
        &self,
        list: &mut ContentList<T>,
        params: &PaginationParams,
    ) -> Result<ListState>
    where
        T: Send,
        P: ContentProvider<T>,
    {
        let state = list.state();
        if state != ListState::Empty {
            debug!(
                list = %list.id,
                items = list.items.len(),
                state = ?state,
                "List already handled"
            );
            return Ok(state);
        }

        if !params.targets(&list.id) {
            debug!(
                list = %list.id,
                requested = params.id.as_deref().unwrap_or(""),
                "Paging request is for another list"
            );
            return Ok(ListState::Empty);
        }

        let start = params.start_offset();
        list.start = start;
        list.current_page = start / list.effective_page_size() + 1;

        debug!(
            list = %list.id,
            start = start,
            page = list.current_page,
            state = ?ListState::Populating,
            "Populating dynamic list"
        );
        list.set_state(ListState::Populating);
        self.provider.populate_dynamic_list(list).await?;
        list.set_state(ListState::Populated);

        Ok(ListState::Populated)
    }
}
