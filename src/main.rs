use anyhow::{Context, Result};
use std::sync::Arc;
use syndic::api::{create_oauth_router, OAuthAppState};
use syndic::config::{self, SyndicConfig};
use syndic::credentials::{CredentialManager, CredentialStore, TokenCache};
use syndic::session::{self, SessionStore, STATE_TTL_SECONDS};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "syndic=info".into()),
        )
        .init();

    let config_path =
        std::env::var("SYNDIC_CONFIG").unwrap_or_else(|_| "syndic.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        config::load_config(&config_path)?
    } else {
        info!(path = %config_path, "No config file found, using defaults");
        SyndicConfig::default()
    };

    let cache = TokenCache::new();
    let store = open_credential_store(&config);
    let manager = Arc::new(CredentialManager::new(cache, store));

    // Restore the persisted credential in the background. Startup does not
    // wait for it; requests arriving first see an empty cache and a
    // "not connected" status until it lands.
    let restore_manager = Arc::clone(&manager);
    tokio::spawn(async move {
        if restore_manager.restore().is_none() {
            debug!("No credential restored at startup");
        }
    });

    let sessions = SessionStore::new(STATE_TTL_SECONDS);
    tokio::spawn(session::run_session_cleanup(sessions.clone(), 300));

    let oauth = syndic::api::oauth::resolve_settings(&config.linkedin);
    if oauth.secrets().is_none() {
        warn!(
            "LINKEDIN_CLIENT_ID / LINKEDIN_CLIENT_SECRET not set; \
             the authorization flow will report a configuration error"
        );
    }

    let app = create_oauth_router(OAuthAppState {
        manager,
        sessions,
        oauth,
    })
    .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    info!(bind = %config.server.bind, mount = %config.linkedin.mount_path, "syndic listening");

    axum::serve(listener, app)
        .await
        .context("Server terminated")?;

    Ok(())
}

/// Open the durable store when an encryption key is configured.
///
/// Without `SYNDIC_ENCRYPTION_KEY` syndic runs cache-only: the flow still
/// works, but the credential does not survive restarts.
fn open_credential_store(config: &SyndicConfig) -> Option<CredentialStore> {
    let key = match std::env::var("SYNDIC_ENCRYPTION_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            info!("SYNDIC_ENCRYPTION_KEY not set, durable credential store disabled");
            return None;
        }
    };

    match CredentialStore::new(&config.credentials.db_path, &key) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(
                error = %e,
                db_path = %config.credentials.db_path,
                "Failed to open credential store, continuing cache-only"
            );
            None
        }
    }
}
