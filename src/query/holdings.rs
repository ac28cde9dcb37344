//! Query state for the cumulative ticker holdings table.
//!
//! Sorting and column filters are translated into the query parameters the
//! holdings endpoint understands. [`HoldingsView`] keeps the rows currently on
//! display and drops responses to requests issued before the latest
//! sort/filter change.

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::{ApiClient, ApiError};

pub const HOLDINGS_PATH: &str = "/journal/cumulative_ticker_holdings";

/// One entry of the sorting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub id: String,
    pub desc: bool,
}

impl SortSpec {
    pub fn asc(id: impl Into<String>) -> Self {
        SortSpec { id: id.into(), desc: false }
    }

    pub fn desc(id: impl Into<String>) -> Self {
        SortSpec { id: id.into(), desc: true }
    }
}

/// One column filter as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnFilter {
    pub id: String,
    pub value: String,
}

impl ColumnFilter {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        ColumnFilter {
            id: id.into(),
            value: value.into(),
        }
    }

    /// Parse `key=value`. The value may itself contain `=`.
    pub fn parse(s: &str) -> Option<ColumnFilter> {
        let (key, value) = s.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(ColumnFilter::new(key, value.trim()))
    }
}

/// Parse a sort argument like `-total_buy_amount,pnl_amount`.
pub fn parse_sorting(s: &str) -> Vec<SortSpec> {
    s.split(',')
        .filter_map(|part| {
            let part = part.trim();
            match part.strip_prefix('-') {
                Some(id) if !id.trim().is_empty() => Some(SortSpec::desc(id.trim())),
                Some(_) => None,
                None if !part.is_empty() => Some(SortSpec::asc(part)),
                None => None,
            }
        })
        .collect()
}

/// Serialize sorting state into the `ordering` parameter, order preserved.
pub fn ordering_string(sorting: &[SortSpec]) -> String {
    sorting
        .iter()
        .map(|sort| format!("{}{}", if sort.desc { "-" } else { "" }, sort.id))
        .collect::<Vec<_>>()
        .join(",")
}

/// Translate column filters into query parameters.
///
/// Keys are lowercased. A `status` filter of `completed` or `open` (any case)
/// becomes the boolean `is_completed`; everything else is passed through.
pub fn filter_params(filters: &[ColumnFilter]) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();

    for filter in filters {
        let key = filter.id.to_lowercase();
        let completed = match filter.value.to_lowercase().as_str() {
            "completed" if key == "status" => Some(true),
            "open" if key == "status" => Some(false),
            _ => None,
        };
        let (key, value) = match completed {
            Some(flag) => ("is_completed".to_string(), flag.to_string()),
            None => (key, filter.value.clone()),
        };

        // Later filters on the same key win.
        params.retain(|(existing, _)| existing != &key);
        params.push((key, value));
    }

    params
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoldingsQuery {
    pub sorting: Vec<SortSpec>,
    pub filters: Vec<ColumnFilter>,
}

impl HoldingsQuery {
    pub fn ordering(&self) -> String {
        ordering_string(&self.sorting)
    }

    /// Full parameter list: `ordering` first (omitted when unsorted), then filters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let ordering = self.ordering();
        if !ordering.is_empty() {
            params.push(("ordering".to_string(), ordering));
        }
        params.extend(filter_params(&self.filters));
        params
    }

    pub fn is_sorted_by(&self, id: &str) -> Option<bool> {
        self.sorting.iter().find(|s| s.id == id).map(|s| s.desc)
    }
}

/// A fetch issued for one generation of the query state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    params: Vec<(String, String)>,
}

impl FetchTicket {
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Failed,
    /// The query changed after this fetch was issued; its result was dropped.
    Stale,
}

/// Displayed holdings plus the query state that produced them.
#[derive(Debug)]
pub struct HoldingsView<T> {
    query: HoldingsQuery,
    generation: u64,
    rows: Vec<T>,
    last_error: Option<String>,
}

impl<T: DeserializeOwned> HoldingsView<T> {
    pub fn new(query: HoldingsQuery) -> Self {
        HoldingsView {
            query,
            generation: 0,
            rows: Vec::new(),
            last_error: None,
        }
    }

    pub fn query(&self) -> &HoldingsQuery {
        &self.query
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_sorting(&mut self, sorting: Vec<SortSpec>) {
        self.query.sorting = sorting;
        self.generation += 1;
    }

    pub fn set_filters(&mut self, filters: Vec<ColumnFilter>) {
        self.query.filters = filters;
        self.generation += 1;
    }

    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
            params: self.query.to_params(),
        }
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "Dropping holdings response for generation {} (current {})",
                ticket.generation, self.generation
            );
            return false;
        }
        true
    }

    pub fn apply_rows(&mut self, ticket: &FetchTicket, rows: Vec<T>) -> FetchOutcome {
        if !self.is_current(ticket) {
            return FetchOutcome::Stale;
        }
        self.rows = rows;
        self.last_error = None;
        FetchOutcome::Applied
    }

    /// Record a failed fetch. Rows already on display are kept.
    pub fn apply_error(&mut self, ticket: &FetchTicket, err: &ApiError) -> FetchOutcome {
        if !self.is_current(ticket) {
            return FetchOutcome::Stale;
        }
        self.last_error = Some(err.to_string());
        FetchOutcome::Failed
    }

    /// Fetch rows for the current query and display them.
    pub fn refresh(&mut self, client: &ApiClient) -> Result<&[T], ApiError> {
        let ticket = self.begin_fetch();
        match fetch_holdings(client, &ticket) {
            Ok(rows) => {
                self.apply_rows(&ticket, rows);
                Ok(&self.rows)
            }
            Err(e) => {
                self.apply_error(&ticket, &e);
                Err(e)
            }
        }
    }
}

pub fn fetch_holdings<T: DeserializeOwned>(
    client: &ApiClient,
    ticket: &FetchTicket,
) -> Result<Vec<T>, ApiError> {
    let request = client
        .get(HOLDINGS_PATH)
        .query_pairs(ticket.params().iter().cloned());
    client.send(request)
}
