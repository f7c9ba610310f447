//! In-memory access token cache.
//!
//! The process-wide fallback surface: components that need the live token
//! read it from here without touching the durable store. Writes are
//! last-write-wins and immediately visible.

use std::sync::{Arc, RwLock};

/// Shared slot holding the current access token.
///
/// Cloning is cheap; all clones observe the same slot. The slot starts
/// empty and lives for the process lifetime.
#[derive(Clone, Default)]
pub struct TokenCache {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached token. Never fails.
    pub fn set(&self, token: &str) {
        *self.token.write().unwrap() = Some(token.to_string());
    }

    /// Current access token, if one has been cached
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    /// Whether a token is currently cached
    pub fn is_set(&self) -> bool {
        self.token.read().unwrap().is_some()
    }
}
