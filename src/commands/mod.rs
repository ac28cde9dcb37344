pub mod accounts;
pub mod auth;
pub mod holdings;
pub mod transactions;

use anyhow::{anyhow, Error};

use crate::api::ApiError;

/// Turn an API error into a user-facing error, with a hint when the
/// server rejected the session.
pub(crate) fn api_failure(err: ApiError, what: &str) -> Error {
    match err.status() {
        Some(401) | Some(403) => anyhow!(
            "{} failed: {}\nYour session may have expired. Run 'monfaristo login <email>' again.",
            what,
            err
        ),
        _ => anyhow!("{} failed: {}", what, err),
    }
}
