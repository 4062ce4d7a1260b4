//! Content query client
//!
//! Posts GraphQL requests to the content endpoint. Forwarded caller claims
//! travel in the `contextData` variable; propagated headers and the
//! authenticator's credentials are attached to every call.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::Authenticator;
use crate::context::{ClaimValue, ContextAware};
use crate::endpoint::ServiceEndpoint;
use crate::types::{PortalError, Result};

/// Variable name carrying forwarded claims
const CONTEXT_DATA_VARIABLE: &str = "contextData";

/// A GraphQL request
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    pub variables: serde_json::Map<String, serde_json::Value>,
}

impl GraphQlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn operation(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn variable(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Client bound to the content endpoint.
///
/// Cheap to create: the HTTP connection pool is shared with the factory
/// and no I/O happens until the first query.
pub struct ContentClient {
    endpoint: ServiceEndpoint,
    http: reqwest::Client,
    auth: Arc<dyn Authenticator>,
    headers: HeaderMap,
    context_data: Vec<ClaimValue>,
}

impl ContentClient {
    pub(crate) fn new(
        endpoint: ServiceEndpoint,
        http: reqwest::Client,
        auth: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            endpoint,
            http,
            auth,
            headers: HeaderMap::new(),
            context_data: Vec::new(),
        }
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// Headers sent with every query
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Claims forwarded with every query
    pub fn context_data(&self) -> &[ClaimValue] {
        &self.context_data
    }

    pub(crate) fn request_body(&self, request: &GraphQlRequest) -> Result<serde_json::Value> {
        let mut request = request.clone();
        if !self.context_data.is_empty() {
            request.variables.insert(
                CONTEXT_DATA_VARIABLE.to_string(),
                serde_json::to_value(&self.context_data)?,
            );
        }
        Ok(serde_json::to_value(&request)?)
    }

    /// Run a query and deserialize its `data`
    pub async fn execute<T: DeserializeOwned>(&self, request: &GraphQlRequest) -> Result<T> {
        let body = self.request_body(request)?;

        let mut builder = self
            .http
            .post(self.endpoint.uri.clone())
            .headers(self.headers.clone())
            .json(&body);
        if let Some(authorization) = self.auth.authorization().await? {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }

        debug!(
            endpoint = %self.endpoint.uri,
            operation = request.operation_name.as_deref().unwrap_or("anonymous"),
            claims = self.context_data.len(),
            "Executing content query"
        );

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(PortalError::Server { status, message });
        }

        let envelope: GraphQlResponse<T> = response.json().await?;
        if !envelope.errors.is_empty() {
            let messages: Vec<_> = envelope.errors.into_iter().map(|e| e.message).collect();
            return Err(PortalError::Query(messages.join("; ")));
        }

        envelope
            .data
            .ok_or_else(|| PortalError::Query("response contained no data".to_string()))
    }
}

impl ContextAware for ContentClient {
    fn set_header(&mut self, name: &str, values: &[String]) -> Result<()> {
        let invalid = |reason: String| PortalError::InvalidHeader {
            name: name.to_string(),
            reason,
        };

        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_values = values
            .iter()
            .map(|v| HeaderValue::from_str(v).map_err(|e| invalid(e.to_string())))
            .collect::<Result<Vec<_>>>()?;

        self.headers.remove(&header_name);
        for value in header_values {
            self.headers.append(header_name.clone(), value);
        }
        Ok(())
    }

    fn add_context_claim(&mut self, claim: ClaimValue) {
        self.context_data.push(claim);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{NoAuthentication, StaticToken};
    use crate::endpoint::ServiceKind;
    use reqwest::Url;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_at(uri: &str, auth: Arc<dyn Authenticator>) -> ContentClient {
        let endpoint = ServiceEndpoint {
            kind: ServiceKind::Content,
            uri: Url::parse(uri).unwrap(),
        };
        ContentClient::new(endpoint, reqwest::Client::new(), auth)
    }

    #[derive(Debug, Deserialize)]
    struct PageData {
        page: Page,
    }

    #[derive(Debug, Deserialize)]
    struct Page {
        title: String,
    }

    #[test]
    fn test_body_omits_context_data_without_claims() {
        let client = client_at("http://cd:8081/udp/content", Arc::new(NoAuthentication));
        let body = client
            .request_body(&GraphQlRequest::new("{ page { title } }").variable("id", 42))
            .unwrap();

        assert_eq!(body["variables"], json!({ "id": 42 }));
        assert!(body.get("operationName").is_none());
    }

    #[test]
    fn test_body_carries_forwarded_claims() {
        let mut client = client_at("http://cd:8081/udp/content", Arc::new(NoAuthentication));
        client.add_context_claim(ClaimValue::string("taf:claim:segment", "gold"));

        let body = client.request_body(&GraphQlRequest::new("{ x }")).unwrap();

        assert_eq!(
            body["variables"]["contextData"],
            json!([{ "uri": "taf:claim:segment", "value": "gold", "type": "STRING" }])
        );
    }

    #[test]
    fn test_set_header_replaces_values() {
        let mut client = client_at("http://cd:8081/udp/content", Arc::new(NoAuthentication));
        client.set_header("x-preview-session-token", &["a".into(), "b".into()]).unwrap();
        client.set_header("x-preview-session-token", &["c".into()]).unwrap();

        let values: Vec<_> = client
            .headers()
            .get_all("x-preview-session-token")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["c"]);
    }

    #[test]
    fn test_set_header_rejects_invalid_value() {
        let mut client = client_at("http://cd:8081/udp/content", Arc::new(NoAuthentication));
        let err = client
            .set_header("x-preview-session-token", &["bad\nvalue".into()])
            .unwrap_err();

        assert!(matches!(err, PortalError::InvalidHeader { .. }));
        assert!(client.headers().is_empty());
    }

    #[tokio::test]
    async fn test_execute_sends_headers_and_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/udp/content"))
            .and(header_eq("authorization", "Bearer pca"))
            .and(header_eq("x-preview-session-token", "abc"))
            .and(body_partial_json(json!({ "operationName": "page" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "page": { "title": "Home" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_at(
            &format!("{}/udp/content", server.uri()),
            Arc::new(StaticToken::bearer("pca")),
        );
        client.set_header("x-preview-session-token", &["abc".into()]).unwrap();

        let data: PageData = client
            .execute(&GraphQlRequest::new("query page { page { title } }").operation("page"))
            .await
            .unwrap();

        assert_eq!(data.page.title, "Home");
    }

    #[tokio::test]
    async fn test_graphql_errors_become_query_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{ "message": "Unknown field 'pge'" }]
            })))
            .mount(&server)
            .await;

        let client = client_at(&server.uri(), Arc::new(NoAuthentication));
        let err = client
            .execute::<PageData>(&GraphQlRequest::new("{ pge { title } }"))
            .await
            .unwrap_err();

        assert!(matches!(err, PortalError::Query(msg) if msg.contains("pge")));
    }

    #[tokio::test]
    async fn test_http_failure_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = client_at(&server.uri(), Arc::new(NoAuthentication));
        let err = client
            .execute::<PageData>(&GraphQlRequest::new("{ page { title } }"))
            .await
            .unwrap_err();

        assert!(matches!(err, PortalError::Server { status: 502, .. }));
    }
}
