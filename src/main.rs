//! Portal - content delivery access layer
//!
//! Resolves the content and search endpoints, builds the client factory and
//! reports what the access layer will talk to.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use portal::{
    auth::{Authenticator, NoAuthentication, OAuthAuthenticator},
    client::{ClientFactory, ClientOptions},
    config::Args,
    context::ContextPropagator,
    discovery::{DiscoveryCapability, DiscoveryClientConfig, HttpDiscoveryClient, StaticDiscovery},
    endpoint::{EndpointResolution, EndpointResolver},
    logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_json);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let forward_list = args.forward_list();

    info!("======================================");
    info!("  Portal - Content Delivery Access");
    info!("======================================");
    info!("Build: {} ({})", env!("GIT_COMMIT_SHORT"), env!("BUILD_TIMESTAMP"));
    info!(
        "Discovery: {}",
        args.discovery_service_uri.as_deref().unwrap_or("(not configured)")
    );
    info!(
        "Auth: {}",
        if args.oauth.oauth_token_uri.is_some() { "OAuth client credentials" } else { "none" }
    );
    info!("Forwarded claims: {}", forward_list.len());
    info!("Request timeout: {}ms", args.request_timeout_ms);
    info!("======================================");

    // Validated above, so these only fail on a bug
    let oauth = args.oauth_config().map_err(anyhow::Error::msg)?;
    let discovery_url = args.discovery_url().map_err(anyhow::Error::msg)?;

    let auth: Arc<dyn Authenticator> = match oauth {
        Some(config) => Arc::new(OAuthAuthenticator::new(config)?),
        None => Arc::new(NoAuthentication),
    };

    let discovery: Arc<dyn DiscoveryCapability> = match discovery_url {
        Some(base_url) => {
            let mut config = DiscoveryClientConfig::new(base_url);
            config.timeout = args.request_timeout();
            Arc::new(HttpDiscoveryClient::new(config, auth.clone())?)
        }
        None => {
            warn!("No discovery service configured; endpoints must come from overrides");
            Arc::new(StaticDiscovery::empty())
        }
    };

    let resolver = EndpointResolver::new(args.endpoint_overrides(), discovery);
    let options = ClientOptions {
        timeout: args.request_timeout(),
        ..Default::default()
    };

    let propagator = ContextPropagator::new(forward_list);
    let factory = match ClientFactory::initialize(&resolver, auth, propagator, options).await {
        Ok(factory) => factory,
        Err(e) => {
            error!("Client factory initialization failed: {}", e);
            std::process::exit(1);
        }
    };

    info!("Content endpoint: {}", factory.content_endpoint().uri);
    match factory.search_endpoint() {
        EndpointResolution::Resolved(endpoint) => info!("Search endpoint: {}", endpoint.uri),
        EndpointResolution::Unavailable => warn!("Search endpoint: unavailable"),
    }

    let summary = serde_json::json!({
        "content": factory.content_endpoint().uri.as_str(),
        "search": factory.search_endpoint().endpoint().map(|e| e.uri.as_str()),
        "forwardedClaims": factory.propagator().forward_list().iter().collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
