use anyhow::{bail, Result};

use crate::api::types::CreateAccountRequest;
use crate::api::ApiClient;
use crate::cli::args::AccountsAction;
use crate::cli::context::RunContext;
use crate::models::InvestmentAccount;
use crate::output::format::{render, OutputMode};
use crate::output::json::to_json;
use crate::output::table::format_account_row;

use super::api_failure;

pub const ACCOUNTS_PATH: &str = "/journal/accounts";
pub const ACCOUNT_PATH: &str = "/journal/account";

pub fn run(ctx: &RunContext, client: &ApiClient, action: &AccountsAction) -> Result<()> {
    match action {
        AccountsAction::List { q } => list(ctx, client, q.as_deref()),
        AccountsAction::Show { id } => show(ctx, client, *id),
        AccountsAction::Create { title, owner_id } => create(ctx, client, title, *owner_id),
    }
}

fn list(ctx: &RunContext, client: &ApiClient, q: Option<&str>) -> Result<()> {
    let mut request = client.get(ACCOUNTS_PATH);
    if let Some(q) = q.filter(|q| !q.is_empty()) {
        request = request.query("q", q);
    }
    let accounts: Vec<InvestmentAccount> = client
        .send(request)
        .map_err(|e| api_failure(e, "Listing accounts"))?;

    match ctx.output_mode {
        OutputMode::Json => println!("{}", to_json(&accounts)),
        OutputMode::Tty => {
            if accounts.is_empty() {
                println!("No accounts found.");
            }
            for account in &accounts {
                println!("{}", format_account_row(account));
            }
        }
    }
    Ok(())
}

fn show(ctx: &RunContext, client: &ApiClient, id: u64) -> Result<()> {
    let account: InvestmentAccount = client
        .send(client.get(format!("{}/{}", ACCOUNT_PATH, id)))
        .map_err(|e| api_failure(e, "Loading account"))?;

    println!("{}", render(ctx.output_mode, &account, format_account_row));
    Ok(())
}

fn create(ctx: &RunContext, client: &ApiClient, title: &str, owner_id: u64) -> Result<()> {
    if title.trim().is_empty() {
        bail!("Account title is empty");
    }
    let body = CreateAccountRequest {
        title: title.to_string(),
        owner_id,
    };
    let account: InvestmentAccount = client
        .send(client.post(ACCOUNT_PATH).json(serde_json::to_value(&body)?))
        .map_err(|e| api_failure(e, "Creating account"))?;

    match ctx.output_mode {
        OutputMode::Json => println!("{}", to_json(&account)),
        OutputMode::Tty => println!("Created {}", format_account_row(&account)),
    }
    Ok(())
}
