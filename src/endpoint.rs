//! Endpoint resolution
//!
//! Turns static overrides plus a discovery capability into concrete
//! service endpoints. An override, when set, is used verbatim and
//! discovery is never consulted for that kind.

use std::fmt;
use std::sync::Arc;

use reqwest::Url;
use serde::Serialize;
use tracing::{debug, info};

use crate::discovery::DiscoveryCapability;
use crate::types::{PortalError, Result};

/// Path segment the discovery service reports for the legacy content service
const LEGACY_CONTENT_SEGMENT: &str = "content.svc";

/// Path segment that routes to the content query API
const CONTENT_API_SEGMENT: &str = "udp/content";

/// Backend services reachable through the access layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Content,
    Search,
}

impl ServiceKind {
    /// Capability name registered with the discovery service
    pub fn capability_name(&self) -> &'static str {
        match self {
            ServiceKind::Content => "ContentServiceCapability",
            ServiceKind::Search => "IQServiceCapability",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Content => write!(f, "content"),
            ServiceKind::Search => write!(f, "search"),
        }
    }
}

/// A resolved backend endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub kind: ServiceKind,
    pub uri: Url,
}

/// Outcome of resolving one service kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointResolution {
    Resolved(ServiceEndpoint),
    Unavailable,
}

impl EndpointResolution {
    pub fn endpoint(&self) -> Option<&ServiceEndpoint> {
        match self {
            EndpointResolution::Resolved(endpoint) => Some(endpoint),
            EndpointResolution::Unavailable => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, EndpointResolution::Resolved(_))
    }
}

/// Statically configured endpoint overrides
#[derive(Debug, Clone, Default)]
pub struct EndpointOverrides {
    pub content: Option<String>,
    pub search: Option<String>,
}

impl EndpointOverrides {
    /// The override for a kind, ignoring empty settings
    pub fn get(&self, kind: ServiceKind) -> Option<&str> {
        let value = match kind {
            ServiceKind::Content => self.content.as_deref(),
            ServiceKind::Search => self.search.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Derive the content API endpoint from a discovered content-service URI
pub fn rewrite_content_uri(discovered: &Url) -> Result<Url> {
    let rewritten = discovered
        .as_str()
        .replace(LEGACY_CONTENT_SEGMENT, CONTENT_API_SEGMENT);
    Url::parse(&rewritten).map_err(|e| {
        PortalError::Discovery(format!("rewritten content URI '{}' is invalid: {}", rewritten, e))
    })
}

/// Resolves service endpoints from overrides, then discovery
pub struct EndpointResolver {
    overrides: EndpointOverrides,
    discovery: Arc<dyn DiscoveryCapability>,
}

impl EndpointResolver {
    pub fn new(overrides: EndpointOverrides, discovery: Arc<dyn DiscoveryCapability>) -> Self {
        Self {
            overrides,
            discovery,
        }
    }

    /// Resolve the endpoint for a service kind.
    ///
    /// Returns `Unavailable` when neither the override nor discovery yields
    /// an endpoint; deciding whether that is fatal is left to the caller.
    /// A malformed override is a configuration error.
    pub async fn resolve(&self, kind: ServiceKind) -> Result<EndpointResolution> {
        if let Some(configured) = self.overrides.get(kind) {
            let uri = Url::parse(configured).map_err(|e| {
                PortalError::Config(format!(
                    "invalid {} endpoint override '{}': {}",
                    kind, configured, e
                ))
            })?;
            info!(kind = %kind, uri = %uri, "Using configured endpoint");
            return Ok(EndpointResolution::Resolved(ServiceEndpoint { kind, uri }));
        }

        let Some(discovered) = self.discovery.resolve(kind).await? else {
            debug!(kind = %kind, "Discovery returned no endpoint");
            return Ok(EndpointResolution::Unavailable);
        };

        let uri = match kind {
            ServiceKind::Content => rewrite_content_uri(&discovered)?,
            ServiceKind::Search => discovered,
        };
        info!(kind = %kind, uri = %uri, "Endpoint located via discovery");

        Ok(EndpointResolution::Resolved(ServiceEndpoint { kind, uri }))
    }
}
