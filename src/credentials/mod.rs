//! Credential cache, storage, and lifecycle management.
//!
//! Exactly one logical credential exists at a time. It lives in two tiers:
//!
//! - [`TokenCache`]: in-memory, process-lifetime mirror of the access token,
//!   readable with zero latency by anything that needs the live token.
//! - [`CredentialStore`]: single-record SQLite persistence surviving
//!   restarts, tokens encrypted at rest with AES-256-GCM.
//!
//! [`CredentialManager`] is the sole writer to both and keeps them
//! consistent: saves go cache-first then store (a store failure is loud),
//! restores go store-to-cache (failures are swallowed).

use chrono::{DateTime, Utc};

mod cache;
mod encryption;
mod manager;
mod store;

pub use cache::TokenCache;
pub use manager::{ConnectionStatus, CredentialManager};
pub use store::CredentialStore;

// Re-export sealing functions for utilities
pub use encryption::{open, seal, validate_key};

/// The LinkedIn credential obtained from a completed authorization flow.
///
/// A new save fully replaces the prior record; fields are never merged
/// across saves.
#[derive(Clone, Debug, PartialEq)]
pub struct Credential {
    /// OAuth access token (used for API requests)
    pub access_token: String,

    /// OpenID identity token, when the provider returns one
    pub id_token: Option<String>,

    /// When this credential was last saved (UTC)
    pub updated_at: DateTime<Utc>,

    /// When the access token expires, when the provider supplies a lifetime
    pub expires_at: Option<DateTime<Utc>>,
}
