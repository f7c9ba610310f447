//! Callback validation and completion.
//!
//! The callback is validated in a fixed order, short-circuiting on the
//! first failure: provider-reported error, then CSRF state match, then the
//! code-for-token exchange. Only a fully validated callback reaches the
//! provider.

use super::authorize::{self, OAuthSettings};
use super::exchange;
use crate::credentials::{Credential, CredentialManager};
use crate::session::SessionStore;
use serde::Deserialize;
use tracing::warn;

/// Query parameters LinkedIn sends to the callback
#[derive(Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Result of handling a callback
#[derive(Debug)]
pub enum CallbackOutcome {
    /// Exchange succeeded and the credential was saved
    Connected(Credential),
    /// The provider declined or aborted the authorization
    ProviderError(String),
    /// CSRF state absent or not matching the session's pending state
    StateMismatch,
    /// Exchange or save failed after validation passed
    ExchangeFailed(String),
}

/// Validate callback parameters against the session's pending state.
///
/// Returns the authorization code when the callback is legitimate. The
/// mismatch message deliberately does not echo the expected state value.
pub fn validate_callback(
    params: &CallbackParams,
    pending_state: Option<&str>,
) -> Result<String, CallbackOutcome> {
    // Provider-reported errors win, regardless of state
    if let Some(error) = &params.error {
        let message = params
            .error_description
            .clone()
            .unwrap_or_else(|| format!("LinkedIn authorization failed: {}", error));
        return Err(CallbackOutcome::ProviderError(message));
    }

    match (params.state.as_deref(), pending_state) {
        (Some(received), Some(pending)) if received == pending => {}
        _ => return Err(CallbackOutcome::StateMismatch),
    }

    match &params.code {
        Some(code) => Ok(code.clone()),
        None => Err(CallbackOutcome::ExchangeFailed(
            "Authorization code missing from callback".to_string(),
        )),
    }
}

/// Handle a callback end to end: validate, exchange, save.
///
/// The session's pending state is consumed the moment it is checked,
/// whether or not it matches, so replaying a callback can never trigger a
/// second exchange. A provider-reported error returns before the state is
/// touched.
pub async fn complete_authorization(
    params: &CallbackParams,
    sessions: &SessionStore,
    session_id: Option<&str>,
    settings: &OAuthSettings,
    redirect_uri: &str,
    manager: &CredentialManager,
) -> CallbackOutcome {
    let pending_state = if params.error.is_none() {
        session_id.and_then(|sid| sessions.take(sid))
    } else {
        None
    };

    let code = match validate_callback(params, pending_state.as_deref()) {
        Ok(code) => code,
        Err(outcome) => return outcome,
    };

    let Some((client_id, client_secret)) = settings.secrets() else {
        return CallbackOutcome::ExchangeFailed(
            authorize::CREDENTIALS_NOT_CONFIGURED.to_string(),
        );
    };

    let credential = match exchange::exchange_code_for_token(
        &settings.token_url,
        &code,
        redirect_uri,
        client_id,
        client_secret,
    )
    .await
    {
        Ok(credential) => credential,
        Err(e) => {
            return CallbackOutcome::ExchangeFailed(format!(
                "Could not obtain access token: {}",
                e
            ));
        }
    };

    if let Err(e) = manager.save(&credential) {
        // The token is already live in the cache; only the durable copy is
        // missing. Reported as a failure so the operator sees it.
        warn!(error = %e, "Credential obtained but durable save failed");
        return CallbackOutcome::ExchangeFailed(format!("Could not save access token: {}", e));
    }

    CallbackOutcome::Connected(credential)
}
