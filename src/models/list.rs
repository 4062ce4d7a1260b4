//! Dynamic content list

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::Link;

/// Page size used when the list definition does not set one
pub const DEFAULT_PAGE_SIZE: u32 = 10;

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn first_page() -> u32 {
    1
}

/// Population state of a list within one render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListState {
    #[default]
    Empty,
    /// A backend query was issued; it failed or has not completed
    Populating,
    Populated,
}

/// A list whose items are fetched from the backend at render time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentList<T> {
    /// Identifier correlating paging requests with this list
    pub id: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub link: Option<Link>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Offset of the first item on the current page
    #[serde(default)]
    pub start: u32,
    /// 1-based page number
    #[serde(default = "first_page")]
    pub current_page: u32,
    /// Set by the content provider when items exist past this page
    #[serde(default)]
    pub has_more: bool,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Render-pass state; never serialized
    #[serde(skip)]
    state: ListState,
}

impl<T> ContentList<T> {
    pub fn new(id: impl Into<String>, page_size: u32) -> Self {
        Self {
            id: id.into(),
            headline: None,
            link: None,
            page_size: page_size.max(1),
            start: 0,
            current_page: 1,
            has_more: false,
            items: Vec::new(),
            state: ListState::Empty,
        }
    }

    pub fn with_items(mut self, items: Vec<T>) -> Self {
        self.items = items;
        self
    }

    /// Lists that arrive with items count as populated
    pub fn state(&self) -> ListState {
        if self.items.is_empty() {
            self.state
        } else {
            ListState::Populated
        }
    }

    pub(crate) fn set_state(&mut self, state: ListState) {
        self.state = state;
    }

    pub fn is_populated(&self) -> bool {
        self.state() == ListState::Populated
    }

    /// Page size, never zero
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.max(1)
    }

    /// Half-open item range of the current page
    pub fn page_range(&self) -> Range<u32> {
        self.start..self.start.saturating_add(self.effective_page_size())
    }

    /// Offset for a "next page" link
    pub fn next_start(&self) -> Option<u32> {
        self.has_more.then(|| self.page_range().end)
    }

    /// Offset for a "previous page" link
    pub fn previous_start(&self) -> Option<u32> {
        (self.start > 0).then(|| self.start.saturating_sub(self.effective_page_size()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zero_page_size_is_clamped() {
        let list: ContentList<String> = ContentList::new("tcm:1-2", 0);
        assert_eq!(list.page_size, 1);
    }

    #[test]
    fn test_paging_offsets() {
        let mut list: ContentList<String> = ContentList::new("tcm:1-2", 20);
        list.start = 40;
        list.has_more = true;

        assert_eq!(list.page_range(), 40..60);
        assert_eq!(list.next_start(), Some(60));
        assert_eq!(list.previous_start(), Some(20));
    }

    #[test]
    fn test_first_page_has_no_previous() {
        let list: ContentList<String> = ContentList::new("tcm:1-2", 20);
        assert_eq!(list.previous_start(), None);
        assert_eq!(list.next_start(), None);
    }

    #[test]
    fn test_deserialize_defaults() {
        let list: ContentList<String> = serde_json::from_value(json!({ "id": "tcm:1-2" })).unwrap();

        assert_eq!(list.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(list.current_page, 1);
        assert!(!list.is_populated());
        assert_eq!(list.state(), ListState::Empty);
    }

    #[test]
    fn test_state_is_not_serialized() {
        let mut list: ContentList<String> = ContentList::new("tcm:1-2", 5);
        list.set_state(ListState::Populated);

        let value = serde_json::to_value(&list).unwrap();
        assert!(value.get("state").is_none());

        let restored: ContentList<String> = serde_json::from_value(value).unwrap();
        assert_eq!(restored.state(), ListState::Empty);
    }
}
