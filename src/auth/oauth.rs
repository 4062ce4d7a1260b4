//! OAuth client-credentials token provider
//!
//! Fetches an access token from the token service and reuses it until
//! shortly before it expires. Refreshes are serialized so a burst of
//! concurrent requests triggers a single token fetch.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::Authenticator;
use crate::types::{PortalError, Result};

/// Lifetime assumed when the token service omits `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 300;

/// Longer lifetimes are capped; the token is simply refreshed sooner
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// OAuth client configuration
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Token service endpoint (e.g. "http://localhost:8082/token.svc")
    pub token_url: Url,
    pub client_id: String,
    pub client_secret: String,
    /// Request timeout for token calls
    pub timeout: Duration,
    /// Refresh this long before the token actually expires
    pub refresh_margin: Duration,
}

impl OAuthConfig {
    pub fn new(
        token_url: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout: Duration::from_secs(30),
            refresh_margin: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Utc::now() < self.refresh_at
    }
}

/// Client-credentials authenticator
pub struct OAuthAuthenticator {
    config: OAuthConfig,
    http: reqwest::Client,
    token: RwLock<Option<CachedToken>>,
    /// Held while fetching so only one refresh runs at a time
    refreshing: Mutex<()>,
}

impl OAuthAuthenticator {
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("portal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(
            token_url = %config.token_url,
            client_id = %config.client_id,
            "OAuth authenticator configured"
        );

        Ok(Self {
            config,
            http,
            token: RwLock::new(None),
            refreshing: Mutex::new(()),
        })
    }

    async fn cached(&self) -> Option<String> {
        let token = self.token.read().await;
        token
            .as_ref()
            .filter(|t| t.is_fresh())
            .map(|t| t.access_token.clone())
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let body = serde_urlencoded::to_string(TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
        })
        .map_err(|e| PortalError::Auth(format!("cannot encode token request: {}", e)))?;

        let response = self
            .http
            .post(self.config.token_url.clone())
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| PortalError::Auth(format!("token service unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PortalError::Auth(format!(
                "token service returned HTTP {} - {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PortalError::Auth(format!("invalid token response: {}", e)))?;

        let expires_in = token
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
            .clamp(0, MAX_TOKEN_LIFETIME_SECS);
        let refresh_at = refresh_deadline(Utc::now(), expires_in, self.config.refresh_margin)?;

        debug!(expires_in, "Fetched access token");

        Ok(CachedToken {
            access_token: token.access_token,
            refresh_at,
        })
    }

    /// Current access token, fetching a new one when needed
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        let _guard = self.refreshing.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        let fresh = self.fetch_token().await?;
        let access_token = fresh.access_token.clone();
        *self.token.write().await = Some(fresh);

        Ok(access_token)
    }
}

/// When a token fetched at `now` should be replaced
fn refresh_deadline(
    now: DateTime<Utc>,
    expires_in: i64,
    margin: Duration,
) -> Result<DateTime<Utc>> {
    let out_of_range =
        || PortalError::Auth(format!("token lifetime out of range: {}s", expires_in));

    let lifetime = chrono::Duration::try_seconds(expires_in).ok_or_else(out_of_range)?;
    let margin = chrono::Duration::from_std(margin).unwrap_or_else(|_| chrono::Duration::zero());

    now.checked_add_signed(lifetime)
        .and_then(|expiry| expiry.checked_sub_signed(margin))
        .ok_or_else(out_of_range)
}

#[async_trait]
impl Authenticator for OAuthAuthenticator {
    async fn authorization(&self) -> Result<Option<String>> {
        let token = self.access_token().await?;
        Ok(Some(format!("Bearer {}", token)))
    }
}
