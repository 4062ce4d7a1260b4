//! Client factory
//!
//! Resolves the backend endpoints once and hands out ready-to-use clients
//! for the rest of the process lifetime. All fields are immutable after
//! construction, so the factory is shared across requests behind an `Arc`
//! without locking.
//!
//! The content endpoint is mandatory: if it cannot be resolved the factory
//! is never built. The search endpoint is optional and its absence only
//! surfaces when a search client is requested.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use super::content::ContentClient;
use super::search::{SearchClient, SearchResult, SearchResultSet};
use crate::auth::Authenticator;
use crate::context::{ContextPropagator, RequestContext};
use crate::endpoint::{EndpointResolution, EndpointResolver, ServiceEndpoint, ServiceKind};
use crate::types::{InitializationError, PortalError, Result};

/// Transport settings shared by all clients
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("portal/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Builds content and search clients bound to the resolved endpoints
pub struct ClientFactory {
    content: ServiceEndpoint,
    search: EndpointResolution,
    auth: Arc<dyn Authenticator>,
    propagator: ContextPropagator,
    http: reqwest::Client,
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("content", &self.content)
            .field("search", &self.search)
            .field("forward_list", self.propagator.forward_list())
            .finish()
    }
}

impl ClientFactory {
    /// Resolve endpoints and build the factory.
    ///
    /// Fails when the content endpoint cannot be resolved or an endpoint
    /// override is malformed. A search endpoint that cannot be resolved
    /// leaves search unavailable without failing construction.
    pub async fn initialize(
        resolver: &EndpointResolver,
        auth: Arc<dyn Authenticator>,
        propagator: ContextPropagator,
        options: ClientOptions,
    ) -> std::result::Result<Self, InitializationError> {
        let content = match resolver.resolve(ServiceKind::Content).await {
            Ok(EndpointResolution::Resolved(endpoint)) => endpoint,
            Ok(EndpointResolution::Unavailable) => {
                error!("Unable to retrieve content endpoint from configuration or discovery");
                return Err(InitializationError::new(
                    "no content endpoint configured or discovered",
                ));
            }
            Err(e) => {
                error!(
                    error = %e,
                    "Content endpoint resolution failed; are the content delivery services running?"
                );
                return Err(InitializationError::new(format!(
                    "content endpoint resolution failed: {}",
                    e
                )));
            }
        };

        let search = match resolver.resolve(ServiceKind::Search).await {
            Ok(resolution) => resolution,
            Err(PortalError::Config(msg)) => {
                error!(error = %msg, "Invalid search endpoint configuration");
                return Err(InitializationError::new(msg));
            }
            Err(e) => {
                warn!(error = %e, "Search endpoint discovery failed; search disabled");
                EndpointResolution::Unavailable
            }
        };

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent)
            .build()
            .map_err(|e| InitializationError::new(format!("HTTP client setup failed: {}", e)))?;

        info!(uri = %content.uri, "Content endpoint ready");
        match &search {
            EndpointResolution::Resolved(endpoint) => {
                info!(uri = %endpoint.uri, "Search endpoint ready")
            }
            EndpointResolution::Unavailable => {
                info!("No search endpoint; search features disabled")
            }
        }

        Ok(Self {
            content,
            search,
            auth,
            propagator,
            http,
        })
    }

    pub fn content_endpoint(&self) -> &ServiceEndpoint {
        &self.content
    }

    pub fn search_endpoint(&self) -> &EndpointResolution {
        &self.search
    }

    pub fn propagator(&self) -> &ContextPropagator {
        &self.propagator
    }

    /// A client bound to the content endpoint, without caller context
    pub fn create_content_client(&self) -> ContentClient {
        ContentClient::new(self.content.clone(), self.http.clone(), Arc::clone(&self.auth))
    }

    /// A content client decorated with the given request's context
    pub fn create_content_client_for(&self, context: Option<&RequestContext>) -> ContentClient {
        self.propagator.decorate(self.create_content_client(), context)
    }

    /// A search client, or `FeatureUnavailable` when no search endpoint was resolved
    pub fn create_search_client<RS, R>(&self) -> Result<SearchClient<RS, R>>
    where
        RS: SearchResultSet<R>,
        R: SearchResult,
    {
        match &self.search {
            EndpointResolution::Resolved(endpoint) => Ok(SearchClient::new(
                endpoint.clone(),
                self.http.clone(),
                Arc::clone(&self.auth),
            )),
            EndpointResolution::Unavailable => {
                Err(PortalError::FeatureUnavailable(ServiceKind::Search))
            }
        }
    }
}

/// Lazily-initialised, process-wide factory slot.
///
/// The first caller runs initialisation; concurrent callers wait for it.
/// The outcome, success or failure, is kept for good: a failed
/// initialisation is reported to every later caller without resolving
/// endpoints again.
#[derive(Debug, Default)]
pub struct SharedFactory {
    cell: OnceCell<std::result::Result<Arc<ClientFactory>, InitializationError>>,
}

impl SharedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The factory, initialising it on first use
    pub async fn get_or_init<F, Fut>(
        &self,
        init: F,
    ) -> std::result::Result<Arc<ClientFactory>, InitializationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<ClientFactory, InitializationError>>,
    {
        self.cell
            .get_or_init(|| async { init().await.map(Arc::new) })
            .await
            .clone()
    }

    /// The factory if initialisation has already completed
    pub fn get(&self) -> Option<std::result::Result<Arc<ClientFactory>, InitializationError>> {
        self.cell.get().cloned()
    }
}
