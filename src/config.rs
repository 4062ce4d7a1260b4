//! Configuration for portal
//!
//! CLI arguments and environment variable handling using clap.

use std::time::Duration;

use clap::Parser;
use reqwest::Url;

use crate::auth::OAuthConfig;
use crate::context::ForwardList;
use crate::endpoint::EndpointOverrides;

/// Portal - content delivery access layer
#[derive(Parser, Debug, Clone)]
#[command(name = "portal")]
#[command(about = "Resolves content delivery endpoints and checks the access layer can start")]
pub struct Args {
    /// Content endpoint override; when set, discovery is not consulted for content
    #[arg(long, env = "PCA_SERVICE_URI")]
    pub content_service_uri: Option<String>,

    /// Search endpoint override; when set, discovery is not consulted for search
    #[arg(long, env = "IQ_SERVICE_URI")]
    pub search_service_uri: Option<String>,

    /// Discovery service base URL (e.g. http://localhost:8082/discovery.svc)
    #[arg(long, env = "DISCOVERY_SERVICE_URI")]
    pub discovery_service_uri: Option<String>,

    /// OAuth settings for backend calls
    #[command(flatten)]
    pub oauth: OAuthArgs,

    /// Comma-separated claim URIs forwarded to the backend on every call
    #[arg(long, env = "FORWARDED_CLAIMS", default_value = "")]
    pub forwarded_claims: String,

    /// Request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

/// OAuth client-credentials configuration
#[derive(Parser, Debug, Clone, Default)]
pub struct OAuthArgs {
    /// Token service URL
    #[arg(long, env = "OAUTH_TOKEN_URI")]
    pub oauth_token_uri: Option<String>,

    /// OAuth client id
    #[arg(long, env = "OAUTH_CLIENT_ID")]
    pub oauth_client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "OAUTH_CLIENT_SECRET", hide_env_values = true)]
    pub oauth_client_secret: Option<String>,
}

impl OAuthArgs {
    fn is_partial(&self) -> bool {
        let set = [
            self.oauth_token_uri.is_some(),
            self.oauth_client_id.is_some(),
            self.oauth_client_secret.is_some(),
        ];
        set.iter().any(|s| *s) && !set.iter().all(|s| *s)
    }
}

impl Args {
    /// Endpoint overrides (empty values count as unset)
    pub fn endpoint_overrides(&self) -> EndpointOverrides {
        EndpointOverrides {
            content: self.content_service_uri.clone(),
            search: self.search_service_uri.clone(),
        }
    }

    pub fn forward_list(&self) -> ForwardList {
        ForwardList::parse(&self.forwarded_claims)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Discovery service URL, if configured
    pub fn discovery_url(&self) -> Result<Option<Url>, String> {
        match self.discovery_service_uri.as_deref().map(str::trim) {
            Some(uri) if !uri.is_empty() => Url::parse(uri)
                .map(Some)
                .map_err(|e| format!("DISCOVERY_SERVICE_URI is not a valid URL: {}", e)),
            _ => Ok(None),
        }
    }

    /// OAuth configuration, if all settings are present
    pub fn oauth_config(&self) -> Result<Option<OAuthConfig>, String> {
        let (Some(token_uri), Some(client_id), Some(client_secret)) = (
            self.oauth.oauth_token_uri.as_deref(),
            self.oauth.oauth_client_id.as_deref(),
            self.oauth.oauth_client_secret.as_deref(),
        ) else {
            return Ok(None);
        };

        let token_url = Url::parse(token_uri)
            .map_err(|e| format!("OAUTH_TOKEN_URI is not a valid URL: {}", e))?;
        let mut config = OAuthConfig::new(token_url, client_id, client_secret);
        config.timeout = self.request_timeout();
        Ok(Some(config))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.oauth.is_partial() {
            return Err(
                "OAUTH_TOKEN_URI, OAUTH_CLIENT_ID and OAUTH_CLIENT_SECRET must be set together"
                    .to_string(),
            );
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        self.discovery_url()?;
        self.oauth_config()?;

        Ok(())
    }
}
