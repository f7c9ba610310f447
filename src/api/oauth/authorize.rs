//! Authorization request building.
//!
//! Derives the callback URL from the inbound request, mints the CSRF state,
//! and assembles the provider authorization URL.

use crate::config::LinkedInConfig;
use axum::http::{header, HeaderMap};
use uuid::Uuid;

/// Error message for the unconfigured-secrets redirect
pub const CREDENTIALS_NOT_CONFIGURED: &str =
    "LinkedIn OAuth credentials not configured. Set LINKEDIN_CLIENT_ID and LINKEDIN_CLIENT_SECRET.";

/// Resolved OAuth settings: endpoint URLs and scopes from config, client
/// secrets from the environment.
#[derive(Clone, Debug)]
pub struct OAuthSettings {
    pub auth_url: String,
    pub token_url: String,
    pub mount_path: String,
    pub scopes: Vec<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl OAuthSettings {
    /// Both secrets, or None when either is missing.
    ///
    /// Missing secrets degrade the flow to an error redirect; they never
    /// crash the process.
    pub fn secrets(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        }
    }

    /// Build the authorization URL with state and redirect_uri.
    ///
    /// Assembled by hand: LinkedIn expects the scope list space-joined and
    /// percent-encoded as one unit, which generic OAuth client encoders get
    /// wrong. The state is a UUID and inserted as-is.
    pub fn build_authorization_url(&self, state: &str, redirect_uri: &str) -> String {
        let scopes = self.scopes.join(" ");
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            self.auth_url,
            urlencoding::encode(self.client_id.as_deref().unwrap_or_default()),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes),
            state
        )
    }
}

/// Resolve runtime OAuth settings from config and environment
pub fn resolve_settings(config: &LinkedInConfig) -> OAuthSettings {
    OAuthSettings {
        auth_url: config.auth_url.clone(),
        token_url: config.token_url.clone(),
        mount_path: config.mount_path.clone(),
        scopes: config.scopes.clone(),
        client_id: non_empty_env("LINKEDIN_CLIENT_ID"),
        client_secret: non_empty_env("LINKEDIN_CLIENT_SECRET"),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Mint a fresh CSRF state token (UUID v4, 122 random bits).
pub fn mint_state() -> String {
    Uuid::new_v4().to_string()
}

/// Derive the callback URL from the inbound request's headers.
///
/// Prefers forwarding headers (reverse proxy), falls back to the raw Host
/// header and plain http. The callback handler re-derives this with the
/// same rules; the two must agree or the provider rejects the exchange.
pub fn derive_callback_url(headers: &HeaderMap, mount_path: &str) -> String {
    let protocol = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .unwrap_or("http");

    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .unwrap_or("localhost");

    format!("{}://{}{}/callback", protocol, host, mount_path)
}
