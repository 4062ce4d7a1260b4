//! View models handed to presentation
//!
//! - `ContentList` - dynamic list populated page by page at render time
//! - `Teaser`, `Link`, `LinkList` - list items and navigation
//! - `MediaItem` - multimedia reference with display helpers

mod list;
mod media;

pub use list::{ContentList, ListState, DEFAULT_PAGE_SIZE};
pub use media::MediaItem;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A hyperlink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub url: String,
    #[serde(default)]
    pub link_text: Option<String>,
    #[serde(default)]
    pub alternate_text: Option<String>,
}

impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            link_text: None,
            alternate_text: None,
        }
    }
}

/// A headed list of links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkList {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Summary of a content item, the usual element of a dynamic list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teaser {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub link: Option<Link>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub media: Option<MediaItem>,
}
