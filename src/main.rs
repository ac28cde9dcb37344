mod api;
mod cli;
mod commands;
mod config;
mod models;
mod output;
mod platform;
mod query;

use anyhow::{Context, Result};
use clap::Parser;

use api::{resolve_session, SessionStore};
use cli::args::{Cli, Commands};
use cli::context::RunContext;

fn main() -> Result<()> {
    setup_broken_pipe_handling();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = RunContext::from_args(cli.json, cli.no_color, cli.utc, cli.api_host.as_deref())?;
    let store = SessionStore::default_location().context("Failed to locate session file")?;

    match &cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&ctx, &store, username, password.as_deref())?;
        }

        Commands::Signup {
            email,
            password,
            first_name,
            last_name,
        } => {
            commands::auth::signup(
                &ctx,
                email,
                password.as_deref(),
                first_name.as_deref(),
                last_name.as_deref(),
            )?;
        }

        Commands::Logout => {
            commands::auth::logout(&ctx, &store)?;
        }

        Commands::Whoami => {
            let resolver = resolve_session(cli.token.as_deref(), store)?;
            commands::auth::whoami(&ctx, resolver.as_ref())?;
        }

        Commands::Holdings {
            sort,
            filters,
            account,
            ticker,
        } => {
            let resolver = resolve_session(cli.token.as_deref(), store)?;
            commands::auth::require_session(resolver.as_ref())?;
            let client = ctx.client(resolver)?;

            let sorting = sort.as_ref().map(|s| s.0.clone()).unwrap_or_default();
            let filters = commands::holdings::build_filters(filters, *account, *ticker);
            commands::holdings::run(&ctx, &client, sorting, filters)?;
        }

        Commands::Accounts { action } => {
            let resolver = resolve_session(cli.token.as_deref(), store)?;
            commands::auth::require_session(resolver.as_ref())?;
            let client = ctx.client(resolver)?;
            commands::accounts::run(&ctx, &client, action)?;
        }

        Commands::Transactions { action } => {
            let resolver = resolve_session(cli.token.as_deref(), store)?;
            commands::auth::require_session(resolver.as_ref())?;
            let client = ctx.client(resolver)?;
            commands::transactions::run(&ctx, &client, action)?;
        }
    }

    Ok(())
}

/// Initialize logging based on the `--verbose` flag or `MONFARISTO_LOG` env var.
///
/// - `MONFARISTO_LOG` env var: full filter control (e.g. `MONFARISTO_LOG=monfaristo::api=trace`)
/// - `--verbose`: sets `monfaristo` crate to `Debug` level
/// - Otherwise: `Warn` level only
fn init_logging(verbose: bool) {
    let env_var = std::env::var("MONFARISTO_LOG").ok();

    let mut builder = env_logger::Builder::new();
    builder.format_target(true);
    builder.format_module_path(false);

    if let Some(ref filter) = env_var {
        builder.parse_filters(filter);
    } else if verbose {
        builder.filter_module("monfaristo", log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }

    builder.init();
}

/// Exit quietly when stdout is closed early, e.g. `monfaristo holdings --json | head -1`.
fn setup_broken_pipe_handling() {
    #[cfg(unix)]
    unsafe {
        // SIGPIPE = 13, SIG_DFL = 0
        unsafe extern "C" {
            fn signal(sig: i32, handler: usize) -> usize;
        }
        signal(13, 0);
    }

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info
            .payload()
            .downcast_ref::<String>()
            .map(|s| s.as_str())
            .or_else(|| info.payload().downcast_ref::<&str>().copied())
            .unwrap_or("");

        if msg.contains("failed printing to stdout") {
            std::process::exit(0);
        }

        default_hook(info);
    }));
}
