use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};

use crate::query::holdings::{parse_sorting, ColumnFilter, SortSpec};

fn parse_column_filter(s: &str) -> Result<ColumnFilter, String> {
    ColumnFilter::parse(s).ok_or_else(|| format!("invalid filter '{}': expected key=value", s))
}

/// Accept `2024-01-15`, `2024-01-15T10:30` or `2024-01-15T10:30:00`.
fn parse_executed_at(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("invalid date '{}': expected e.g. 2024-01-15 or 2024-01-15T10:30", s))
}

/// Value of `--sort`: the whole comma-separated list.
#[derive(Debug, Clone, PartialEq)]
pub struct SortArg(pub Vec<SortSpec>);

fn parse_sort(s: &str) -> Result<SortArg, String> {
    let sorting = parse_sorting(s);
    if sorting.is_empty() && !s.trim().is_empty() {
        return Err(format!("invalid sort '{}': expected e.g. -pnl_amount,ticker_code", s));
    }
    Ok(SortArg(sorting))
}

#[derive(Parser, Debug)]
#[command(name = "monfaristo", version = env!("MONFARISTO_VERSION"), about = "Browse your investment journal from the terminal")]
pub struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Display dates in UTC instead of local time
    #[arg(long, global = true)]
    pub utc: bool,

    /// Journal API base URL [default: $MONFARISTO_API_HOST, config.toml, or http://localhost:8000]
    #[arg(long, global = true)]
    pub api_host: Option<String>,

    /// Use a specific API token instead of the session saved by `login`
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Enable verbose output for debugging API calls
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Exchange email and password for an API token and save the session
    Login {
        /// Account email
        username: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Create a new user on the journal server
    Signup {
        /// Account email
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },

    /// Forget the saved session
    Logout,

    /// Show who the current session belongs to
    Whoami,

    /// Show cumulative holdings per ticker
    #[command(visible_alias = "h")]
    Holdings {
        /// Sort columns, comma-separated, '-' prefix for descending [e.g., -total_buy_amount,pnl_amount]
        #[arg(long, value_parser = parse_sort, allow_hyphen_values = true)]
        sort: Option<SortArg>,

        /// Column filter as key=value, repeatable [e.g., status=open]
        #[arg(long = "filter", value_parser = parse_column_filter)]
        filters: Vec<ColumnFilter>,

        /// Only holdings of this investment account
        #[arg(long)]
        account: Option<u64>,

        /// Only holdings of this ticker
        #[arg(long)]
        ticker: Option<u64>,
    },

    /// Investment accounts
    Accounts {
        #[command(subcommand)]
        action: AccountsAction,
    },

    /// Buy and sell transactions
    #[command(visible_alias = "tx")]
    Transactions {
        #[command(subcommand)]
        action: TransactionsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountsAction {
    /// List investment accounts
    #[command(visible_alias = "ls")]
    List {
        /// Search text
        #[arg(long)]
        q: Option<String>,
    },
    /// Show one investment account
    Show {
        /// Account ID
        id: u64,
    },
    /// Create an investment account
    Create {
        /// Account title
        #[arg(long)]
        title: String,

        /// ID of the user owning the account
        #[arg(long)]
        owner_id: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum TransactionsAction {
    /// List transactions
    #[command(visible_alias = "ls")]
    List {
        /// Search text
        #[arg(long)]
        q: Option<String>,

        /// Filter by investment account ID
        #[arg(long)]
        account: Option<u64>,

        /// Filter by executing user ID
        #[arg(long)]
        executed_by: Option<u64>,

        /// Filter by transaction type [e.g., buy, sell]
        #[arg(long = "type")]
        transaction_type: Option<String>,
    },
    /// Show one transaction
    Show {
        /// Transaction ID
        id: u64,
    },
    /// Record a transaction
    Create {
        /// Transaction type [e.g., BUY, SELL]
        #[arg(long = "type")]
        transaction_type: String,

        /// Ticker ID
        #[arg(long)]
        ticker: u64,

        /// Investment account ID
        #[arg(long)]
        account: u64,

        /// Trading platform ID
        #[arg(long)]
        platform: u64,

        /// Price per unit
        #[arg(long)]
        price: f64,

        /// Number of units
        #[arg(long)]
        count: f64,

        /// Commission paid
        #[arg(long, default_value = "0")]
        commission: f64,

        /// Execution time in UTC [default: now, set by the server]
        #[arg(long, value_parser = parse_executed_at)]
        executed_at: Option<NaiveDateTime>,

        /// User who executed the trade [default: you]
        #[arg(long)]
        executed_by: Option<u64>,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        notes: String,

        /// Holding time frame label
        #[arg(long)]
        time_frame: Option<String>,
    },
}
