use anyhow::{Context, Result};
use serde::Deserialize;

/// Complete syndic configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyndicConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub linkedin: LinkedInConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// LinkedIn OAuth configuration.
///
/// Client ID and secret are not part of the config file; they are read from
/// the `LINKEDIN_CLIENT_ID` and `LINKEDIN_CLIENT_SECRET` environment
/// variables at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkedInConfig {
    /// Path prefix the endpoint is mounted under
    #[serde(default = "default_mount_path")]
    pub mount_path: String,

    /// OAuth scopes requested during authorization
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Authorization endpoint URL
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Token exchange endpoint URL
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

fn default_mount_path() -> String {
    "/linkedin".to_string()
}

fn default_scopes() -> Vec<String> {
    vec![
        "openid".to_string(),
        "profile".to_string(),
        "w_member_social".to_string(),
    ]
}

fn default_auth_url() -> String {
    "https://www.linkedin.com/oauth/v2/authorization".to_string()
}

fn default_token_url() -> String {
    "https://www.linkedin.com/oauth/v2/accessToken".to_string()
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            mount_path: default_mount_path(),
            scopes: default_scopes(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
        }
    }
}

/// Durable credential store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "credentials.db".to_string()
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for SyndicConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            linkedin: LinkedInConfig::default(),
            credentials: CredentialsConfig::default(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<SyndicConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: SyndicConfig =
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyndicConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.linkedin.mount_path, "/linkedin");
        assert_eq!(
            config.linkedin.scopes,
            vec!["openid", "profile", "w_member_social"]
        );
        assert_eq!(
            config.linkedin.auth_url,
            "https://www.linkedin.com/oauth/v2/authorization"
        );
        assert_eq!(
            config.linkedin.token_url,
            "https://www.linkedin.com/oauth/v2/accessToken"
        );
        assert_eq!(config.credentials.db_path, "credentials.db");
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [server]
            bind = "127.0.0.1:9090"

            [linkedin]
            mount_path = "/connect/linkedin"
            scopes = ["openid", "email"]

            [credentials]
            db_path = "/var/lib/syndic/credentials.db"
        "#;

        let config: SyndicConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9090");
        assert_eq!(config.linkedin.mount_path, "/connect/linkedin");
        assert_eq!(config.linkedin.scopes, vec!["openid", "email"]);
        assert_eq!(config.credentials.db_path, "/var/lib/syndic/credentials.db");
    }

    #[test]
    fn test_partial_config() {
        // Missing sections use defaults
        let toml = r#"
            [server]
            bind = "0.0.0.0:3000"
        "#;

        let config: SyndicConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.linkedin.mount_path, "/linkedin"); // Default
        assert_eq!(config.credentials.db_path, "credentials.db"); // Default
    }

    #[test]
    fn test_endpoint_urls_overridable() {
        let toml = r#"
            [linkedin]
            auth_url = "http://localhost:9999/authorize"
            token_url = "http://localhost:9999/accessToken"
        "#;

        let config: SyndicConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.linkedin.auth_url, "http://localhost:9999/authorize");
        assert_eq!(
            config.linkedin.token_url,
            "http://localhost:9999/accessToken"
        );
    }
}
