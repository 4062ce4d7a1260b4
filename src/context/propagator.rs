//! Context propagation onto outgoing clients
//!
//! Makes an outgoing client look, from the backend's side, like the
//! original inbound caller:
//! 1. Preview session token header is copied across verbatim
//! 2. Preview session token cookie is copied onto the same header
//! 3. Whitelisted claims are attached as forwarded context data
//!
//! Steps 1 and 2 are independent, so when both are present the cookie
//! value is applied last and wins.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::{ClaimValue, RequestContext};
use crate::types::Result;

/// Header carrying the preview session token, inbound and outbound
pub const PREVIEW_SESSION_TOKEN_HEADER: &str = "x-preview-session-token";

/// Cookie carrying the preview session token
pub const PREVIEW_SESSION_TOKEN_COOKIE: &str = "preview-session-token";

/// A client that can carry caller context
pub trait ContextAware {
    /// Set a header, replacing any existing values for that name
    fn set_header(&mut self, name: &str, values: &[String]) -> Result<()>;

    /// Attach a forwarded claim
    fn add_context_claim(&mut self, claim: ClaimValue);
}

/// Claim URIs forwarded to the backend on every call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardList {
    uris: Vec<String>,
}

impl ForwardList {
    /// Build from URIs, dropping blanks and duplicates (first occurrence kept)
    pub fn new<I, S>(uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let uris = uris
            .into_iter()
            .map(|uri| {
                let uri: String = uri.into();
                uri.trim().to_string()
            })
            .filter(|uri| !uri.is_empty())
            .filter(|uri| seen.insert(uri.clone()))
            .collect();
        Self { uris }
    }

    /// Parse a comma-separated list
    pub fn parse(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.uris.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}

/// Decorates clients with the current request's context
#[derive(Debug, Clone, Default)]
pub struct ContextPropagator {
    forward_list: ForwardList,
}

impl ContextPropagator {
    pub fn new(forward_list: ForwardList) -> Self {
        Self { forward_list }
    }

    pub fn forward_list(&self) -> &ForwardList {
        &self.forward_list
    }

    /// Decorate a client with the caller's context.
    ///
    /// Never fails: a missing context or missing claims leave the client
    /// as it was, and headers the transport cannot carry are skipped.
    pub fn decorate<C: ContextAware>(&self, mut client: C, context: Option<&RequestContext>) -> C {
        let Some(context) = context else {
            warn!("No request context available; backend calls will not carry caller context");
            return client;
        };

        if let Some(values) = context.header(PREVIEW_SESSION_TOKEN_HEADER) {
            apply_header(&mut client, values);
        }

        if let Some(token) = context.cookie(PREVIEW_SESSION_TOKEN_COOKIE) {
            apply_header(&mut client, &[token.to_string()]);
        }

        for uri in self.forward_list.iter() {
            match context.get(uri) {
                Some(claim) if !claim.is_null() => {
                    client.add_context_claim(ClaimValue::string(uri, claim.to_string()));
                }
                _ => debug!(uri = %uri, "Forwarded claim not present in request context"),
            }
        }

        client
    }
}

fn apply_header<C: ContextAware>(client: &mut C, values: &[String]) {
    if values.is_empty() {
        return;
    }
    if let Err(e) = client.set_header(PREVIEW_SESSION_TOKEN_HEADER, values) {
        warn!(error = %e, "Preview session token could not be forwarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Claim;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    struct RecordingClient {
        headers: HashMap<String, Vec<String>>,
        claims: Vec<ClaimValue>,
    }

    impl ContextAware for RecordingClient {
        fn set_header(&mut self, name: &str, values: &[String]) -> Result<()> {
            self.headers.insert(name.to_string(), values.to_vec());
            Ok(())
        }

        fn add_context_claim(&mut self, claim: ClaimValue) {
            self.claims.push(claim);
        }
    }

    fn token_header(client: &RecordingClient) -> Option<&str> {
        client
            .headers
            .get(PREVIEW_SESSION_TOKEN_HEADER)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    #[test]
    fn test_header_token_is_forwarded() {
        let ctx = RequestContext::new().with_header("X-Preview-Session-Token", "abc");
        let client = ContextPropagator::default().decorate(RecordingClient::default(), Some(&ctx));

        assert_eq!(token_header(&client), Some("abc"));
    }

    #[test]
    fn test_cookie_token_becomes_header() {
        let ctx = RequestContext::new().with_cookie(PREVIEW_SESSION_TOKEN_COOKIE, "xyz");
        let client = ContextPropagator::default().decorate(RecordingClient::default(), Some(&ctx));

        assert_eq!(token_header(&client), Some("xyz"));
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let ctx = RequestContext::new()
            .with_header(PREVIEW_SESSION_TOKEN_HEADER, "abc")
            .with_cookie(PREVIEW_SESSION_TOKEN_COOKIE, "xyz");
        let client = ContextPropagator::default().decorate(RecordingClient::default(), Some(&ctx));

        assert_eq!(
            client.headers.get(PREVIEW_SESSION_TOKEN_HEADER),
            Some(&vec!["xyz".to_string()])
        );
    }

    #[test]
    fn test_absent_context_leaves_client_untouched() {
        let propagator = ContextPropagator::new(ForwardList::parse("taf:claim:a"));
        let client = propagator.decorate(RecordingClient::default(), None);

        assert!(client.headers.is_empty());
        assert!(client.claims.is_empty());
    }

    #[test]
    fn test_forward_list_is_deduplicated() {
        let list = ForwardList::parse("taf:claim:a, taf:claim:a,,taf:claim:b");
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["taf:claim:a", "taf:claim:b"]);

        let ctx = RequestContext::new().with_claim("taf:claim:a", "one");
        let client = ContextPropagator::new(list).decorate(RecordingClient::default(), Some(&ctx));

        assert_eq!(client.claims, vec![ClaimValue::string("taf:claim:a", "one")]);
    }

    #[test]
    fn test_missing_and_null_claims_are_skipped() {
        let ctx = RequestContext::new()
            .with_claim("taf:claim:null", Claim::Value(serde_json::Value::Null))
            .with_claim("taf:claim:number", serde_json::json!(7));
        let propagator = ContextPropagator::new(ForwardList::new([
            "taf:claim:missing",
            "taf:claim:null",
            "taf:claim:number",
        ]));

        let client = propagator.decorate(RecordingClient::default(), Some(&ctx));

        assert_eq!(client.claims, vec![ClaimValue::string("taf:claim:number", "7")]);
    }

    #[test]
    fn test_empty_forward_list_adds_no_claims() {
        let ctx = RequestContext::new().with_claim("taf:claim:a", "one");
        let client = ContextPropagator::default().decorate(RecordingClient::default(), Some(&ctx));

        assert!(client.claims.is_empty());
        assert!(client.headers.is_empty());
    }

    #[test]
    fn test_header_failure_is_not_fatal() {
        struct RejectingClient(Vec<ClaimValue>);

        impl ContextAware for RejectingClient {
            fn set_header(&mut self, name: &str, _values: &[String]) -> Result<()> {
                Err(crate::types::PortalError::InvalidHeader {
                    name: name.to_string(),
                    reason: "rejected".into(),
                })
            }

            fn add_context_claim(&mut self, claim: ClaimValue) {
                self.0.push(claim);
            }
        }

        let ctx = RequestContext::new()
            .with_header(PREVIEW_SESSION_TOKEN_HEADER, "abc")
            .with_claim("taf:claim:a", "one");
        let propagator = ContextPropagator::new(ForwardList::parse("taf:claim:a"));

        let client = propagator.decorate(RejectingClient(Vec::new()), Some(&ctx));
        assert_eq!(client.0.len(), 1);
    }
}
