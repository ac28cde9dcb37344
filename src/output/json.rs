use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::Session;
use crate::query::holdings::HoldingsQuery;

/// Serialize any serializable value to pretty JSON string.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Session as shown by `whoami --json`. The token itself is never printed.
#[derive(Debug, Serialize)]
pub struct SessionJson {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub token_chars: usize,
}

impl SessionJson {
    pub fn from_session(session: &Session) -> Self {
        SessionJson {
            authenticated: true,
            email: session.email.clone(),
            name: session.display_name(),
            created_at: session.created_at,
            token_chars: session.api_token.len(),
        }
    }
}

/// Holdings together with the query parameters that produced them.
#[derive(Debug, Serialize)]
pub struct HoldingsJson<'a, T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
    pub params: Vec<(String, String)>,
    pub holdings: &'a [T],
}

pub fn format_holdings<T: Serialize>(query: &HoldingsQuery, holdings: &[T]) -> String {
    let ordering = query.ordering();
    to_json(&HoldingsJson {
        ordering: (!ordering.is_empty()).then_some(ordering),
        params: query.to_params(),
        holdings,
    })
}
