//! Portal - content delivery access layer
//!
//! Gives page-rendering code authenticated access to the content delivery
//! backend without each caller knowing where the services live.
//!
//! ## Components
//!
//! - **Endpoints**: content/search URIs from configuration overrides or the discovery service
//! - **Auth**: per-request authorization (OAuth client credentials or none)
//! - **Clients**: a factory, built once per process, that hands out isolated content
//!   and search clients
//! - **Context**: forwards preview tokens and configured claims from the inbound request
//! - **Pagination**: decides when a dynamic list is populated and from which offset

pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod discovery;
pub mod endpoint;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod types;

pub use client::{ClientFactory, ClientOptions, ContentClient, SearchClient, SharedFactory};
pub use config::Args;
pub use context::{ContextPropagator, ForwardList, RequestContext};
pub use endpoint::{EndpointResolution, EndpointResolver, ServiceEndpoint, ServiceKind};
pub use models::ContentList;
pub use pagination::{ContentProvider, ListPaginationEngine, ListState, PaginationParams};
pub use types::{InitializationError, PortalError, Result};
