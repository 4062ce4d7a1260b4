//! Request-scoped context
//!
//! Each inbound request owns one `RequestContext`: a claim store keyed by
//! URI holding the request's headers, cookies and any extra facts the
//! caller attached. It is passed explicitly down the request path and is
//! only ever read by the propagator.

mod propagator;

pub use propagator::{
    ContextAware, ContextPropagator, ForwardList, PREVIEW_SESSION_TOKEN_COOKIE,
    PREVIEW_SESSION_TOKEN_HEADER,
};

use std::collections::HashMap;
use std::fmt;

use reqwest::header::{self, HeaderMap};
use serde::{Deserialize, Serialize};

/// Well-known claim URIs
pub mod claims {
    /// Inbound request headers, name -> values
    pub const REQUEST_HEADERS: &str = "taf:request:headers";
    /// Inbound request cookies, name -> value
    pub const REQUEST_COOKIES: &str = "taf:request:cookies";
}

/// A single piece of contextual data in the claim store
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    Headers(HashMap<String, Vec<String>>),
    Cookies(HashMap<String, String>),
    Value(serde_json::Value),
}

impl Claim {
    pub fn is_null(&self) -> bool {
        matches!(self, Claim::Value(serde_json::Value::Null))
    }
}

impl From<String> for Claim {
    fn from(value: String) -> Self {
        Claim::Value(serde_json::Value::String(value))
    }
}

impl From<&str> for Claim {
    fn from(value: &str) -> Self {
        Claim::Value(serde_json::Value::String(value.to_string()))
    }
}

impl From<serde_json::Value> for Claim {
    fn from(value: serde_json::Value) -> Self {
        Claim::Value(value)
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Plain strings travel without JSON quoting
            Claim::Value(serde_json::Value::String(s)) => write!(f, "{}", s),
            Claim::Value(value) => write!(f, "{}", value),
            Claim::Headers(map) => write!(f, "{}", serde_json::json!(map)),
            Claim::Cookies(map) => write!(f, "{}", serde_json::json!(map)),
        }
    }
}

/// Type tag of a forwarded claim value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClaimValueType {
    String,
}

/// Forwarded claim as sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimValue {
    pub uri: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: ClaimValueType,
}

impl ClaimValue {
    pub fn string(uri: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            value: value.into(),
            value_type: ClaimValueType::String,
        }
    }
}

/// Claim store for one inbound request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    claims: HashMap<String, Claim>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the context from inbound HTTP headers.
    ///
    /// Header names are stored lower-cased; repeated headers keep every
    /// value. Cookies are parsed from all `Cookie` headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut header_claim: HashMap<String, Vec<String>> = HashMap::new();
        let mut cookie_claim: HashMap<String, String> = HashMap::new();

        for (name, value) in headers {
            let Ok(value) = value.to_str() else {
                continue;
            };
            header_claim
                .entry(name.as_str().to_string())
                .or_default()
                .push(value.to_string());

            if *name == header::COOKIE {
                cookie_claim.extend(parse_cookies(value));
            }
        }

        Self::new()
            .with_claim(claims::REQUEST_HEADERS, Claim::Headers(header_claim))
            .with_claim(claims::REQUEST_COOKIES, Claim::Cookies(cookie_claim))
    }

    /// Add or replace a claim
    pub fn insert(&mut self, uri: impl Into<String>, claim: impl Into<Claim>) {
        self.claims.insert(uri.into(), claim.into());
    }

    pub fn with_claim(mut self, uri: impl Into<String>, claim: impl Into<Claim>) -> Self {
        self.insert(uri, claim);
        self
    }

    /// Add a single inbound header value
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let entry = self
            .claims
            .entry(claims::REQUEST_HEADERS.to_string())
            .or_insert_with(|| Claim::Headers(HashMap::new()));
        if let Claim::Headers(map) = entry {
            map.entry(name.to_ascii_lowercase())
                .or_default()
                .push(value.into());
        }
        self
    }

    /// Add a single inbound cookie
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let entry = self
            .claims
            .entry(claims::REQUEST_COOKIES.to_string())
            .or_insert_with(|| Claim::Cookies(HashMap::new()));
        if let Claim::Cookies(map) = entry {
            map.insert(name.into(), value.into());
        }
        self
    }

    pub fn get(&self, uri: &str) -> Option<&Claim> {
        self.claims.get(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.claims.contains_key(uri)
    }

    /// Inbound header values by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&[String]> {
        match self.get(claims::REQUEST_HEADERS)? {
            Claim::Headers(map) => map
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, values)| values.as_slice()),
            _ => None,
        }
    }

    /// Inbound cookie value by name
    pub fn cookie(&self, name: &str) -> Option<&str> {
        match self.get(claims::REQUEST_COOKIES)? {
            Claim::Cookies(map) => map.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

/// Parse a `Cookie` header value (`a=1; b=2`)
fn parse_cookies(header_value: &str) -> impl Iterator<Item = (String, String)> + '_ {
    header_value.split(';').filter_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some((name.to_string(), value.trim().trim_matches('"').to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_from_headers_collects_headers_and_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert("x-preview-session-token", HeaderValue::from_static("abc"));
        headers.append(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en"));
        headers.append(header::ACCEPT_LANGUAGE, HeaderValue::from_static("nl"));
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("preview-session-token=xyz; theme=\"dark\"; =skip"),
        );

        let ctx = RequestContext::from_headers(&headers);

        assert_eq!(ctx.header("x-preview-session-token"), Some(&["abc".to_string()][..]));
        assert_eq!(ctx.header("Accept-Language").unwrap().len(), 2);
        assert_eq!(ctx.cookie("preview-session-token"), Some("xyz"));
        assert_eq!(ctx.cookie("theme"), Some("dark"));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_missing_maps_yield_none() {
        let ctx = RequestContext::new().with_claim("taf:claim:user", "alice");

        assert!(ctx.header("anything").is_none());
        assert!(ctx.cookie("anything").is_none());
        assert!(ctx.contains("taf:claim:user"));
    }

    #[test]
    fn test_claim_display() {
        assert_eq!(Claim::from("plain").to_string(), "plain");
        assert_eq!(Claim::from(serde_json::json!(42)).to_string(), "42");
        assert_eq!(Claim::from(serde_json::json!(true)).to_string(), "true");
        assert!(Claim::Value(serde_json::Value::Null).is_null());
    }

    #[test]
    fn test_claim_value_wire_shape() {
        let value = ClaimValue::string("taf:claim:audience", "beta");
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            serde_json::json!({ "uri": "taf:claim:audience", "value": "beta", "type": "STRING" })
        );
    }
}
