//! `signup`, `login`, `logout` and `whoami`.

use std::io::{self, BufRead, IsTerminal};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use colored::Colorize;
use log::debug;

use crate::api::types::CreateUserRequest;
use crate::api::{authenticate, NoSession, Session, SessionResolver, SessionStore};
use crate::cli::context::RunContext;
use crate::models::AccountOwner;
use crate::output::format::{render, OutputMode};
use crate::output::json::{to_json, SessionJson};
use crate::output::progress::create_spinner;
use crate::output::table::format_greeting;

use super::api_failure;

pub const SIGNUP_PATH: &str = "/user/create";

/// Resolve the session or fail with a hint to log in.
pub fn require_session(resolver: &dyn SessionResolver) -> Result<Session> {
    match resolver.current_session() {
        Some(session) => Ok(session),
        None => bail!("Not logged in. Run 'monfaristo login <email>' first."),
    }
}

fn read_password() -> Result<String> {
    if io::stdin().is_terminal() {
        eprint!("Password: ");
    }
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn login(ctx: &RunContext, store: &SessionStore, username: &str, password: Option<&str>) -> Result<()> {
    let password = match password {
        Some(p) => p.to_string(),
        None => read_password()?,
    };
    if password.is_empty() {
        bail!("Password is empty");
    }

    // A stale saved token must not ride along on the token exchange.
    let client = ctx.client(Arc::new(NoSession))?;

    let spinner = create_spinner("Signing in...");
    let result = authenticate(&client, username, &password);
    spinner.finish_and_clear();
    let success = result?;

    let session = Session {
        api_token: success.token,
        email: Some(success.user.email),
        first_name: None,
        last_name: None,
        created_at: Some(Utc::now()),
    };
    store
        .save(&session)
        .with_context(|| format!("Failed to save session to {}", store.path().display()))?;
    debug!("Saved session to {}", store.path().display());

    match ctx.output_mode {
        OutputMode::Json => println!("{}", to_json(&SessionJson::from_session(&session))),
        OutputMode::Tty => {
            eprintln!("[monfaristo] Session saved to {}", store.path().display());
            println!("{}", format_greeting(&session));
        }
    }
    Ok(())
}

pub fn signup(
    ctx: &RunContext,
    email: &str,
    password: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<()> {
    let password = match password {
        Some(p) => p.to_string(),
        None => read_password()?,
    };
    if password.is_empty() {
        bail!("Password is empty");
    }

    let request = CreateUserRequest {
        email: email.to_string(),
        first_name: first_name.map(str::to_string),
        last_name: last_name.map(str::to_string),
        password,
    };
    let client = ctx.client(Arc::new(NoSession))?;
    let user: AccountOwner = client
        .send(client.post(SIGNUP_PATH).json(serde_json::to_value(&request)?))
        .map_err(|e| api_failure(e, "Creating user"))?;

    match ctx.output_mode {
        OutputMode::Json => println!("{}", to_json(&user)),
        OutputMode::Tty => {
            let email = user.email.as_deref().unwrap_or(email);
            println!("Created user {}.", email.bold());
            eprintln!("[monfaristo] Run 'monfaristo login {}' to sign in.", email);
        }
    }
    Ok(())
}

pub fn logout(ctx: &RunContext, store: &SessionStore) -> Result<()> {
    let removed = store
        .clear()
        .with_context(|| format!("Failed to remove {}", store.path().display()))?;

    match ctx.output_mode {
        OutputMode::Json => println!("{}", serde_json::json!({ "logged_out": removed })),
        OutputMode::Tty if removed => println!("Logged out."),
        OutputMode::Tty => println!("No saved session."),
    }
    Ok(())
}

pub fn whoami(ctx: &RunContext, resolver: &dyn SessionResolver) -> Result<()> {
    let session = require_session(resolver)?;
    let view = SessionJson::from_session(&session);
    println!(
        "{}",
        render(ctx.output_mode, &view, |_| format_greeting(&session))
    );
    Ok(())
}
