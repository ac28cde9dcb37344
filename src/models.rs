//! Domain types for monfaristo.
//!
//! These mirror what the journal API serializes. Everything is optional with
//! `#[serde(default)]` so a backend that adds or drops a field does not break
//! rendering, and unknown fields are kept in `extra` for `--json` output.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Market Reference Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Currency {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Market {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Ticker {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub market: Option<Market>,
}

// ============================================================================
// Account Types
// ============================================================================

/// Owner of an investment account
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AccountOwner {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl AccountOwner {
    pub fn full_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(name), None) | (None, Some(name)) => Some(name.to_string()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct InvestmentAccount {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub owner: Option<AccountOwner>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ============================================================================
// Holding Types
// ============================================================================

/// Aggregated position for one ticker in one investment account.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Holding {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub ticker: Option<Ticker>,
    #[serde(default)]
    pub investment_account: Option<InvestmentAccount>,
    #[serde(default)]
    pub avg_cost: Option<f64>,
    #[serde(default)]
    pub count: Option<f64>,
    #[serde(default)]
    pub total_buys: Option<f64>,
    #[serde(default)]
    pub total_sells: Option<f64>,
    #[serde(default)]
    pub total_buy_amount: Option<f64>,
    #[serde(default)]
    pub total_sell_amount: Option<f64>,
    #[serde(default)]
    pub total_commission_cost: Option<f64>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub adjusted_avg_cost: Option<f64>,
    #[serde(default)]
    pub pnl_amount: Option<f64>,
    #[serde(default)]
    pub pnl_ratio: Option<f64>,
    #[serde(default)]
    pub first_transaction_at: Option<String>,
    #[serde(default)]
    pub last_transaction_at: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Holding {
    pub fn ticker_code(&self) -> Option<&str> {
        self.ticker.as_ref().and_then(|t| t.code.as_deref())
    }

    pub fn market_code(&self) -> Option<&str> {
        self.ticker
            .as_ref()
            .and_then(|t| t.market.as_ref())
            .and_then(|m| m.code.as_deref())
    }

    /// Currency code amounts are denominated in, from the ticker's market.
    pub fn currency_code(&self) -> Option<&str> {
        self.ticker
            .as_ref()
            .and_then(|t| t.market.as_ref())
            .and_then(|m| m.currency.as_ref())
            .and_then(|c| c.code.as_deref())
    }

    pub fn account_title(&self) -> Option<&str> {
        self.investment_account
            .as_ref()
            .and_then(|a| a.title.as_deref())
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_completed.unwrap_or(false) {
            "Completed"
        } else {
            "Open"
        }
    }
}

// ============================================================================
// Transaction Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub ticker_id: Option<i64>,
    #[serde(default)]
    pub investment_account_id: Option<i64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub count: Option<f64>,
    #[serde(default)]
    pub commission: Option<f64>,
    #[serde(rename = "type", default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub executed_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}
