//! Authentication for outgoing backend calls
//!
//! Provides:
//! - `Authenticator` - credential capability shared by every client
//! - `OAuthAuthenticator` - client-credentials grant with token caching
//! - `StaticToken` - fixed bearer token / API key
//! - `NoAuthentication` - anonymous access

pub mod oauth;

pub use oauth::{OAuthAuthenticator, OAuthConfig};

use async_trait::async_trait;

use crate::types::Result;

/// Supplies the `Authorization` header value for outgoing calls.
///
/// Implementations are constructed once and shared by all clients.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Header value to send, or `None` for anonymous access
    async fn authorization(&self) -> Result<Option<String>>;
}

/// Anonymous access
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthentication;

#[async_trait]
impl Authenticator for NoAuthentication {
    async fn authorization(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Fixed credential sent unchanged on every call
#[derive(Debug, Clone)]
pub struct StaticToken {
    value: String,
}

impl StaticToken {
    pub fn bearer(token: impl AsRef<str>) -> Self {
        Self {
            value: format!("Bearer {}", token.as_ref()),
        }
    }
}

#[async_trait]
impl Authenticator for StaticToken {
    async fn authorization(&self) -> Result<Option<String>> {
        Ok(Some(self.value.clone()))
    }
}
