use anyhow::{bail, Result};

use crate::api::types::{CreateTransactionRequest, TransactionQuery};
use crate::api::ApiClient;
use crate::cli::args::TransactionsAction;
use crate::cli::context::RunContext;
use crate::models::Transaction;
use crate::output::format::{render, OutputMode};
use crate::output::json::to_json;
use crate::output::table::format_transaction_row;

use super::api_failure;

pub const TRANSACTIONS_PATH: &str = "/journal/transactions";
pub const TRANSACTION_PATH: &str = "/journal/transaction";

pub fn run(ctx: &RunContext, client: &ApiClient, action: &TransactionsAction) -> Result<()> {
    match action {
        TransactionsAction::List {
            q,
            account,
            executed_by,
            transaction_type,
        } => {
            let query = TransactionQuery {
                q: q.clone(),
                investment_account: *account,
                executed_by: *executed_by,
                transaction_type: transaction_type.clone(),
            };
            list(ctx, client, &query)
        }
        TransactionsAction::Show { id } => show(ctx, client, *id),
        TransactionsAction::Create {
            transaction_type,
            ticker,
            account,
            platform,
            price,
            count,
            commission,
            executed_at,
            executed_by,
            description,
            notes,
            time_frame,
        } => {
            let request = CreateTransactionRequest {
                ticker_id: *ticker,
                price: *price,
                count: *count,
                commission: *commission,
                transaction_type: transaction_type.clone(),
                investment_account_id: *account,
                platform_id: *platform,
                executed_at: *executed_at,
                executed_by_id: *executed_by,
                description: description.clone(),
                notes: notes.clone(),
                time_frame: time_frame.clone(),
            };
            create(ctx, client, &request)
        }
    }
}

fn list(ctx: &RunContext, client: &ApiClient, query: &TransactionQuery) -> Result<()> {
    let request = client.get(TRANSACTIONS_PATH).query_pairs(query.to_params());
    let transactions: Vec<Transaction> = client
        .send(request)
        .map_err(|e| api_failure(e, "Listing transactions"))?;

    match ctx.output_mode {
        OutputMode::Json => println!("{}", to_json(&transactions)),
        OutputMode::Tty => {
            if transactions.is_empty() {
                println!("No transactions found.");
            }
            for tx in &transactions {
                println!("{}", format_transaction_row(tx, &ctx.tz));
            }
        }
    }
    Ok(())
}

fn show(ctx: &RunContext, client: &ApiClient, id: u64) -> Result<()> {
    let tx: Transaction = client
        .send(client.get(format!("{}/{}", TRANSACTION_PATH, id)))
        .map_err(|e| api_failure(e, "Loading transaction"))?;

    println!(
        "{}",
        render(ctx.output_mode, &tx, |tx| format_transaction_row(tx, &ctx.tz))
    );
    Ok(())
}

fn create(ctx: &RunContext, client: &ApiClient, request: &CreateTransactionRequest) -> Result<()> {
    if let Err(reason) = request.validate() {
        bail!("Invalid transaction: {}", reason);
    }

    let tx: Transaction = client
        .send(client.post(TRANSACTION_PATH).json(serde_json::to_value(request)?))
        .map_err(|e| api_failure(e, "Recording transaction"))?;

    match ctx.output_mode {
        OutputMode::Json => println!("{}", to_json(&tx)),
        OutputMode::Tty => println!("Recorded {}", format_transaction_row(&tx, &ctx.tz)),
    }
    Ok(())
}
