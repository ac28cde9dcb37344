use std::env;
use std::sync::Arc;

use anyhow::{bail, Result};
use log::debug;
use thiserror::Error;

use super::client::{ApiClient, ApiError};
use super::session::{FixedSession, Session, SessionResolver, SessionStore};
use super::types::TokenResponse;

pub const TOKEN_PATH: &str = "/user/token";
pub const TOKEN_ENV: &str = "MONFARISTO_TOKEN";

/// Identity echoed back from a successful token exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSuccess {
    pub token: String,
    pub user: Credentials,
}

#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("Login rejected by the server ({status}). Check your email and password.")]
    Rejected { status: u16 },

    #[error("Could not reach the token endpoint: {0}")]
    Network(String),

    #[error("Unexpected token response: {0}")]
    MalformedResponse(String),
}

impl From<ApiError> for AuthFailure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status, .. } => AuthFailure::Rejected { status },
            ApiError::InvalidResponse(reason) => AuthFailure::MalformedResponse(reason),
            other => AuthFailure::Network(other.to_string()),
        }
    }
}

/// Exchange an email and password for an API token.
pub fn authenticate(
    client: &ApiClient,
    username: &str,
    password: &str,
) -> Result<AuthSuccess, AuthFailure> {
    debug!("Requesting token for {}", username);
    let request = client
        .post(TOKEN_PATH)
        .multipart(&[("username", username), ("password", password)]);

    let response: TokenResponse = client.send(request)?;
    let token = response
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthFailure::MalformedResponse("missing access_token".to_string()))?;

    debug!("Received token ({} chars)", token.len());
    Ok(AuthSuccess {
        token,
        user: Credentials {
            email: username.to_string(),
            password: password.to_string(),
        },
    })
}

/// Like [`authenticate`], treating every failure as "no result".
pub fn authenticate_opt(client: &ApiClient, username: &str, password: &str) -> Option<AuthSuccess> {
    authenticate(client, username, password)
        .map_err(|e| debug!("Authentication failed: {}", e))
        .ok()
}

/// Resolve where the session comes from: an explicit token (flag, then
/// `MONFARISTO_TOKEN`), or the session cached by `login`.
pub fn resolve_session(
    override_token: Option<&str>,
    store: SessionStore,
) -> Result<Arc<dyn SessionResolver>> {
    let env_token = env::var(TOKEN_ENV).ok();
    resolve_session_from(override_token, env_token.as_deref(), store)
}

fn resolve_session_from(
    override_token: Option<&str>,
    env_token: Option<&str>,
    store: SessionStore,
) -> Result<Arc<dyn SessionResolver>> {
    match override_token {
        Some(token) if token.is_empty() => {
            bail!("Provided --token value is empty")
        }
        Some(token) => {
            debug!("Using provided --token override ({} chars)", token.len());
            Ok(Arc::new(FixedSession(Session::from_token(token))))
        }
        None => match env_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                debug!("Using {} ({} chars)", TOKEN_ENV, token.len());
                Ok(Arc::new(FixedSession(Session::from_token(token))))
            }
            None => {
                debug!("Using cached session at {}", store.path().display());
                Ok(Arc::new(store))
            }
        },
    }
}
