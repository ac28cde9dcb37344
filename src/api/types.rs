use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// Token Exchange
// ============================================================================

/// Response from `POST /user/token`
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

// ============================================================================
// Account Requests
// ============================================================================

/// Request body for `POST /journal/account`
#[derive(Debug, Serialize)]
pub struct CreateAccountRequest {
    pub title: String,
    pub owner_id: u64,
}

// ============================================================================
// User Requests
// ============================================================================

/// Request body for `POST /user/create`
#[derive(Debug, Serialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: String,
}

// ============================================================================
// Transaction Requests
// ============================================================================

/// Request body for `POST /journal/transaction`. Omitted optionals take the
/// server defaults: `executed_at` now, `executed_by_id` the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTransactionRequest {
    pub ticker_id: u64,
    pub price: f64,
    pub count: f64,
    pub commission: f64,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub investment_account_id: u64,
    pub platform_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_by_id: Option<u64>,
    pub description: String,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_frame: Option<String>,
}

impl CreateTransactionRequest {
    /// Check the bounds the server enforces, so bad input fails before a round trip.
    pub fn validate(&self) -> Result<(), String> {
        if self.ticker_id == 0 {
            return Err("ticker id must be greater than 0".to_string());
        }
        if self.investment_account_id == 0 {
            return Err("account id must be greater than 0".to_string());
        }
        if self.platform_id == 0 {
            return Err("platform id must be greater than 0".to_string());
        }
        if !(self.count > 0.0) {
            return Err(format!("count must be greater than 0, got {}", self.count));
        }
        if !(self.price >= 0.0) {
            return Err(format!("price must not be negative, got {}", self.price));
        }
        if !(self.commission >= 0.0) {
            return Err(format!("commission must not be negative, got {}", self.commission));
        }
        if self.transaction_type.trim().is_empty() {
            return Err("transaction type is empty".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Transaction Queries
// ============================================================================

/// Query parameters for `GET /journal/transactions`. Unset fields are omitted.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionQuery {
    pub q: Option<String>,
    pub investment_account: Option<u64>,
    pub executed_by: Option<u64>,
    pub transaction_type: Option<String>,
}

impl TransactionQuery {
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) {
            params.push(("q".to_string(), q.to_string()));
        }
        if let Some(id) = self.investment_account {
            params.push(("investment_account".to_string(), id.to_string()));
        }
        if let Some(id) = self.executed_by {
            params.push(("executed_by".to_string(), id.to_string()));
        }
        if let Some(t) = &self.transaction_type {
            params.push(("type".to_string(), t.clone()));
        }
        params
    }
}
