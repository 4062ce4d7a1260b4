//! Backend clients
//!
//! - `ClientFactory` - resolves endpoints once, builds clients on demand
//! - `ContentClient` - GraphQL queries against the content service
//! - `SearchClient` - typed queries against the search service

mod content;
mod factory;
mod search;

pub use content::{ContentClient, GraphQlRequest};
pub use factory::{ClientFactory, ClientOptions, SharedFactory};
pub use search::{
    SearchClient, SearchHit, SearchQuery, SearchResult, SearchResultSet, SearchResults,
};
