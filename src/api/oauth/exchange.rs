//! OAuth token exchange.
//!
//! Exchanges the authorization code for an access token at the provider's
//! token endpoint.

use crate::credentials::Credential;
use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// Token response (standard OAuth 2.0 plus LinkedIn's OpenID id_token)
#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchange an authorization code for an access token.
///
/// # Arguments
/// * `token_url` - OAuth token endpoint URL
/// * `code` - Authorization code from the callback
/// * `redirect_uri` - Callback URL used in the authorization request
/// * `client_id` / `client_secret` - OAuth app credentials
pub async fn exchange_code_for_token(
    token_url: &str,
    code: &str,
    redirect_uri: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<Credential> {
    let client = reqwest::Client::new();

    let mut form_data = HashMap::new();
    form_data.insert("grant_type", "authorization_code");
    form_data.insert("code", code);
    form_data.insert("redirect_uri", redirect_uri);
    form_data.insert("client_id", client_id);
    form_data.insert("client_secret", client_secret);

    tracing::debug!("Exchanging authorization code for token at {}", token_url);

    let response = client
        .post(token_url)
        .header("Accept", "application/json")
        .form(&form_data)
        .send()
        .await
        .context("Failed to send token exchange request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(anyhow!(
            "Token exchange failed with status {}: {}",
            status,
            body
        ));
    }

    let token_response: TokenResponse = response
        .json()
        .await
        .context("Failed to parse token response")?;

    tracing::debug!(
        "Token exchange successful, has_id_token={}, expires_in={:?}",
        token_response.id_token.is_some(),
        token_response.expires_in
    );

    let updated_at = Utc::now();
    let expires_at = token_response
        .expires_in
        .map(|seconds| updated_at + Duration::seconds(seconds));

    Ok(Credential {
        access_token: token_response.access_token,
        id_token: token_response.id_token,
        updated_at,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_deserialization() {
        let json = r#"{
            "access_token": "AQX1234567890",
            "id_token": "eyJhbGciOi.header.payload",
            "expires_in": 5184000,
            "scope": "openid,profile,w_member_social",
            "token_type": "Bearer"
        }"#;

        let response: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access_token, "AQX1234567890");
        assert_eq!(
            response.id_token,
            Some("eyJhbGciOi.header.payload".to_string())
        );
        assert_eq!(response.expires_in, Some(5184000));
    }

    #[test]
    fn test_token_response_minimal() {
        let json = r#"{
            "access_token": "token_12345"
        }"#;

        let response: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access_token, "token_12345");
        assert_eq!(response.id_token, None);
        assert_eq!(response.expires_in, None);
    }
}
