//! HTTP discovery client
//!
//! Queries the discovery service's environment capabilities:
//!
//! ```text
//! GET {base}/Environment/ContentServiceCapability  ->  { "URI": "http://cd:8081/content.svc" }
//! GET {base}/Environment/IQServiceCapability       ->  { "URI": "http://iq:8097" }
//! ```
//!
//! OData v2 style `{ "d": { "URI": ... } }` envelopes are accepted as well.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use super::DiscoveryCapability;
use crate::auth::Authenticator;
use crate::endpoint::ServiceKind;
use crate::types::{PortalError, Result};

/// Discovery client configuration
#[derive(Debug, Clone)]
pub struct DiscoveryClientConfig {
    /// Discovery service base URL (e.g. "http://localhost:8082/discovery.svc")
    pub base_url: Url,
    /// Timeout for capability lookups
    pub timeout: Duration,
}

impl DiscoveryClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CapabilityResponse {
    #[serde(rename = "URI", alias = "uri", default)]
    uri: Option<String>,
    #[serde(rename = "d", default)]
    envelope: Option<Box<CapabilityResponse>>,
}

impl CapabilityResponse {
    fn into_uri(self) -> Option<String> {
        match self.uri {
            Some(uri) if !uri.trim().is_empty() => Some(uri),
            _ => self.envelope.and_then(|inner| inner.into_uri()),
        }
    }
}

/// Discovery capability backed by the discovery service
pub struct HttpDiscoveryClient {
    config: DiscoveryClientConfig,
    http: reqwest::Client,
    auth: Arc<dyn Authenticator>,
}

impl HttpDiscoveryClient {
    /// Create a new discovery client
    pub fn new(config: DiscoveryClientConfig, auth: Arc<dyn Authenticator>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("portal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, http, auth })
    }

    fn capability_url(&self, kind: ServiceKind) -> String {
        format!(
            "{}/Environment/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            kind.capability_name()
        )
    }
}

#[async_trait]
impl DiscoveryCapability for HttpDiscoveryClient {
    async fn resolve(&self, kind: ServiceKind) -> Result<Option<Url>> {
        let url = self.capability_url(kind);
        debug!(kind = %kind, url = %url, "Querying discovery service");

        let mut request = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json");
        if let Some(authorization) = self.auth.authorization().await? {
            request = request.header(header::AUTHORIZATION, authorization);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PortalError::Discovery(format!("{}: {}", url, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(kind = %kind, "Capability not registered with discovery service");
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PortalError::Discovery(format!(
                "HTTP {} from {} - {}",
                status, url, body
            )));
        }

        let capability: CapabilityResponse = response
            .json()
            .await
            .map_err(|e| PortalError::Discovery(format!("invalid capability document: {}", e)))?;

        match capability.into_uri() {
            Some(uri) => Url::parse(&uri).map(Some).map_err(|e| {
                PortalError::Discovery(format!("invalid {} URI '{}': {}", kind, uri, e))
            }),
            None => {
                warn!(kind = %kind, "Capability document has no URI");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{NoAuthentication, StaticToken};
    use serde_json::json;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, auth: Arc<dyn Authenticator>) -> HttpDiscoveryClient {
        let base = Url::parse(&format!("{}/discovery.svc", server.uri())).unwrap();
        HttpDiscoveryClient::new(DiscoveryClientConfig::new(base), auth).unwrap()
    }

    #[tokio::test]
    async fn test_resolves_content_capability() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discovery.svc/Environment/ContentServiceCapability"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "URI": "http://cd.example.com:8081/content.svc" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(NoAuthentication));
        let uri = client.resolve(ServiceKind::Content).await.unwrap();

        assert_eq!(
            uri.unwrap().as_str(),
            "http://cd.example.com:8081/content.svc"
        );
    }

    #[tokio::test]
    async fn test_accepts_odata_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discovery.svc/Environment/IQServiceCapability"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "d": { "URI": "http://iq.example.com:8097/" } })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(NoAuthentication));
        let uri = client.resolve(ServiceKind::Search).await.unwrap();

        assert_eq!(uri.unwrap().as_str(), "http://iq.example.com:8097/");
    }

    #[tokio::test]
    async fn test_missing_capability_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(NoAuthentication));
        assert!(client.resolve(ServiceKind::Search).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_uri_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "URI": "" })))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(NoAuthentication));
        assert!(client.resolve(ServiceKind::Content).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_discovery_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(NoAuthentication));
        let err = client.resolve(ServiceKind::Content).await.unwrap_err();

        assert!(matches!(err, PortalError::Discovery(_)));
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_eq("authorization", "Bearer discovery-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "URI": "http://cd:8081/" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(StaticToken::bearer("discovery-token")));
        assert!(client.resolve(ServiceKind::Content).await.unwrap().is_some());
    }
}
