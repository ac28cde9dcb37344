use anyhow::Result;
use log::debug;

use crate::api::ApiClient;
use crate::cli::context::RunContext;
use crate::models::Holding;
use crate::output::format::OutputMode;
use crate::output::json::format_holdings;
use crate::output::progress::create_spinner;
use crate::output::table::format_holdings_table;
use crate::query::holdings::{ColumnFilter, HoldingsQuery, HoldingsView, SortSpec};

use super::api_failure;

/// Column filters from `--filter` plus the `--account`/`--ticker` shorthands.
/// Shorthands come last so they win over a `--filter` on the same key.
pub fn build_filters(
    filters: &[ColumnFilter],
    account: Option<u64>,
    ticker: Option<u64>,
) -> Vec<ColumnFilter> {
    let mut all = filters.to_vec();
    if let Some(id) = account {
        all.push(ColumnFilter::new("investment_account_id", id.to_string()));
    }
    if let Some(id) = ticker {
        all.push(ColumnFilter::new("ticker_id", id.to_string()));
    }
    all
}

pub fn run(
    ctx: &RunContext,
    client: &ApiClient,
    sorting: Vec<SortSpec>,
    filters: Vec<ColumnFilter>,
) -> Result<()> {
    let mut view: HoldingsView<Holding> = HoldingsView::new(HoldingsQuery::default());
    view.set_sorting(sorting);
    view.set_filters(filters);
    debug!("Holdings query: {:?}", view.query().to_params());

    let spinner = create_spinner("Loading holdings...");
    let result = view.refresh(client).map(|rows| rows.len());
    spinner.finish_and_clear();
    if let Some(reason) = view.last_error() {
        debug!("Holdings fetch failed, {} rows kept: {}", view.rows().len(), reason);
    }
    let count = result.map_err(|e| api_failure(e, "Loading holdings"))?;

    match ctx.output_mode {
        OutputMode::Json => println!("{}", format_holdings(view.query(), view.rows())),
        OutputMode::Tty => {
            if count == 0 {
                println!("No holdings found.");
            } else {
                println!("{}", format_holdings_table(view.rows(), view.query(), &ctx.tz));
            }
        }
    }
    Ok(())
}
