//! Service discovery
//!
//! Maps a backend service kind to its current network endpoint:
//! - `HttpDiscoveryClient` asks a discovery service over HTTP
//! - `StaticDiscovery` answers from a fixed in-memory table

mod client;

pub use client::{DiscoveryClientConfig, HttpDiscoveryClient};

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::Url;

use crate::endpoint::ServiceKind;
use crate::types::Result;

/// Lookup of backend endpoints by service kind.
///
/// `Ok(None)` means the service is not registered; `Err` means discovery
/// itself could not be reached.
#[async_trait]
pub trait DiscoveryCapability: Send + Sync {
    async fn resolve(&self, kind: ServiceKind) -> Result<Option<Url>>;
}

/// Discovery answered from a fixed table
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    endpoints: HashMap<ServiceKind, Url>,
    lookups: AtomicUsize,
}

impl StaticDiscovery {
    /// Discovery that knows no services
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register an endpoint for a service kind
    pub fn with_endpoint(mut self, kind: ServiceKind, uri: Url) -> Self {
        self.endpoints.insert(kind, uri);
        self
    }

    /// Number of lookups served so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiscoveryCapability for StaticDiscovery {
    async fn resolve(&self, kind: ServiceKind) -> Result<Option<Url>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.endpoints.get(&kind).cloned())
    }
}
