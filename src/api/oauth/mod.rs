//! LinkedIn OAuth 2.0 authorization flow.
//!
//! Implements the authorization code flow for the single operator account:
//! 1. Operator opens the status page and clicks "Connect"
//! 2. GET {mount}/auth → redirect to LinkedIn with a CSRF state
//! 3. Operator authorizes on LinkedIn's site
//! 4. LinkedIn redirects to GET {mount}/callback
//! 5. Validate, exchange code for token, save credential
//! 6. Redirect back to the status page
//!
//! Every failure on the flow ends in a redirect to the status page with a
//! human-readable `error` query parameter; nothing here is fatal to the
//! process.

pub mod authorize;
pub mod callback;
mod exchange;

pub use authorize::{resolve_settings, OAuthSettings};
pub use callback::{CallbackOutcome, CallbackParams};

use crate::credentials::{ConnectionStatus, CredentialManager};
use crate::session::{self, SessionStore};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared application state for the OAuth endpoint
#[derive(Clone)]
pub struct OAuthAppState {
    pub manager: Arc<CredentialManager>,
    pub sessions: SessionStore,
    pub oauth: OAuthSettings,
}

/// Status page query parameters (banners after a redirect)
#[derive(Deserialize)]
struct StatusQuery {
    success: Option<String>,
    error: Option<String>,
}

/// Create the endpoint router, nested under the configured mount path
pub fn create_oauth_router(state: OAuthAppState) -> Router {
    let mount_path = state.oauth.mount_path.clone();

    let routes = Router::new()
        .route("/", get(status_page))
        .route("/auth", get(auth_start))
        .route("/callback", get(oauth_callback))
        .with_state(Arc::new(state));

    // Nesting at the root is not supported by the router; serve directly
    if mount_path.is_empty() || mount_path == "/" {
        routes
    } else {
        Router::new().nest(&mount_path, routes)
    }
}

/// GET {mount}/ - Status page showing connection state
async fn status_page(
    State(state): State<Arc<OAuthAppState>>,
    Query(query): Query<StatusQuery>,
) -> Html<String> {
    let status = state.manager.status();
    let success = query.success.as_deref() == Some("true");

    Html(render_status_page(
        &state.oauth.mount_path,
        &status,
        success,
        query.error.as_deref(),
    ))
}

/// GET {mount}/auth - Start the OAuth flow
///
/// Mints the CSRF state, stores it on the caller's session, and redirects
/// to LinkedIn's authorization page.
async fn auth_start(State(state): State<Arc<OAuthAppState>>, headers: HeaderMap) -> Response {
    if state.oauth.secrets().is_none() {
        warn!("OAuth flow requested without configured credentials");
        return redirect_with_error(&state.oauth.mount_path, authorize::CREDENTIALS_NOT_CONFIGURED);
    }

    // Reuse the caller's session or start a fresh one
    let session_id = session::session_id_from_headers(&headers)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let csrf_state = authorize::mint_state();
    state.sessions.begin(&session_id, &csrf_state);

    let redirect_uri = authorize::derive_callback_url(&headers, &state.oauth.mount_path);
    let auth_url = state.oauth.build_authorization_url(&csrf_state, &redirect_uri);

    info!(redirect_uri = %redirect_uri, "Redirecting to LinkedIn authorization page");

    let mut response = Redirect::temporary(&auth_url).into_response();
    if let Ok(cookie) =
        HeaderValue::from_str(&session::session_cookie(&session_id, &state.oauth.mount_path))
    {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

/// GET {mount}/callback - Complete the OAuth flow
async fn oauth_callback(
    State(state): State<Arc<OAuthAppState>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    debug!("OAuth callback received");

    let session_id = session::session_id_from_headers(&headers);

    // Must match the URL sent in the authorization request
    let redirect_uri = authorize::derive_callback_url(&headers, &state.oauth.mount_path);

    let outcome = callback::complete_authorization(
        &params,
        &state.sessions,
        session_id.as_deref(),
        &state.oauth,
        &redirect_uri,
        &state.manager,
    )
    .await;

    let mount_path = &state.oauth.mount_path;
    match outcome {
        CallbackOutcome::Connected(credential) => {
            info!(
                has_id_token = credential.id_token.is_some(),
                "LinkedIn account connected"
            );
            Redirect::temporary(&format!("{}?success=true", status_path(mount_path)))
                .into_response()
        }
        CallbackOutcome::ProviderError(message) => {
            warn!(message = %message, "LinkedIn reported an authorization error");
            redirect_with_error(mount_path, &message)
        }
        CallbackOutcome::StateMismatch => {
            warn!("OAuth state mismatch, rejecting callback");
            redirect_with_error(
                mount_path,
                "Authorization failed: state mismatch. Please try again.",
            )
        }
        CallbackOutcome::ExchangeFailed(message) => {
            warn!(message = %message, "Token exchange failed");
            redirect_with_error(mount_path, &message)
        }
    }
}

fn status_path(mount_path: &str) -> &str {
    if mount_path.is_empty() {
        "/"
    } else {
        mount_path
    }
}

fn redirect_with_error(mount_path: &str, message: &str) -> Response {
    let target = format!(
        "{}?error={}",
        status_path(mount_path),
        urlencoding::encode(message)
    );
    Redirect::temporary(&target).into_response()
}

fn render_status_page(
    mount_path: &str,
    status: &ConnectionStatus,
    success: bool,
    error: Option<&str>,
) -> String {
    let mut body = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>LinkedIn</title></head>\n<body>\n<h1>LinkedIn</h1>\n",
    );

    if success {
        body.push_str(
            "<p class=\"success\">Successfully connected to LinkedIn. \
             Your access token has been saved.</p>\n",
        );
    }

    if let Some(error) = error {
        // Error text echoes provider input; escape it
        body.push_str(&format!(
            "<p class=\"error\">{}</p>\n",
            escape_html(error)
        ));
    }

    if status.connected {
        body.push_str("<p>Status: connected</p>\n");
        if let Some(updated_at) = status.updated_at {
            body.push_str(&format!(
                "<p>Updated: {}</p>\n",
                updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        if let Some(expires_at) = status.expires_at {
            body.push_str(&format!(
                "<p>Expires: {}</p>\n",
                expires_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
    } else {
        body.push_str("<p>Status: not connected</p>\n");
    }

    body.push_str(&format!(
        "<p><a href=\"{}/auth\">Connect LinkedIn</a></p>\n</body>\n</html>\n",
        mount_path
    ));

    body
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
