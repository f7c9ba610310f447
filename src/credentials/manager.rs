//! Credential lifecycle: save, restore, and status.

use super::{Credential, CredentialStore, TokenCache};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Connection status as shown on the status page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Sole writer to both credential tiers.
///
/// The store is optional: without one, syndic runs cache-only and the
/// credential does not survive restarts.
pub struct CredentialManager {
    cache: TokenCache,
    store: Option<CredentialStore>,
}

impl CredentialManager {
    pub fn new(cache: TokenCache, store: Option<CredentialStore>) -> Self {
        Self { cache, store }
    }

    /// Saves a freshly obtained credential.
    ///
    /// The cache is written first so the token is usable immediately and
    /// remains usable when the store is down. A store failure fails the save
    /// loudly; the cache write is not rolled back, so the token stays live
    /// in-process even when the caller reports an error.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        self.cache.set(&credential.access_token);

        if let Some(store) = &self.store {
            store
                .put(credential)
                .context("Failed to persist credential")?;
            debug!("Credential persisted to durable store");
        }

        Ok(())
    }

    /// Restores the persisted credential into the cache.
    ///
    /// Best-effort: runs unattended at boot, so a missing store, an empty
    /// store, or any read failure all yield `None` rather than an error.
    pub fn restore(&self) -> Option<Credential> {
        let store = self.store.as_ref()?;

        match store.get() {
            Ok(Some(credential)) => {
                self.cache.set(&credential.access_token);
                info!("Restored credential from durable store");
                Some(credential)
            }
            Ok(None) => {
                debug!("No stored credential to restore");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to restore credential");
                None
            }
        }
    }

    /// Current connection status.
    ///
    /// Prefers the durable record (it carries timestamps); falls back to the
    /// cache when the store is absent, empty, or unreadable.
    pub fn status(&self) -> ConnectionStatus {
        if let Some(store) = &self.store {
            match store.get() {
                Ok(Some(credential)) if !credential.access_token.is_empty() => {
                    return ConnectionStatus {
                        connected: true,
                        updated_at: Some(credential.updated_at),
                        expires_at: credential.expires_at,
                    };
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Failed to read credential for status");
                }
            }
        }

        ConnectionStatus {
            connected: self.cache.is_set(),
            updated_at: None,
            expires_at: None,
        }
    }

    /// The in-memory token slot, for components that read the live token
    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }
}
