use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use colored::Colorize;

use crate::api::Session;
use crate::models::{Holding, InvestmentAccount, Transaction};
use crate::query::holdings::HoldingsQuery;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Align {
    Left,
    Right,
}

/// A visible column of the holdings table. `id` is the backend field name
/// used for sorting and filtering.
struct Column {
    id: &'static str,
    header: &'static str,
    align: Align,
}

const HOLDING_COLUMNS: &[Column] = &[
    Column { id: "ticker_code", header: "Ticker", align: Align::Left },
    Column { id: "market_code", header: "Market", align: Align::Left },
    Column { id: "investment_account", header: "Account", align: Align::Left },
    Column { id: "status", header: "Status", align: Align::Left },
    Column { id: "total_buy_amount", header: "Total Buy Amount", align: Align::Right },
    Column { id: "total_sell_amount", header: "Total Sell Amount", align: Align::Right },
    Column { id: "pnl_amount", header: "PnL", align: Align::Right },
    Column { id: "pnl_ratio", header: "PnL %", align: Align::Right },
    Column { id: "first_transaction_at", header: "First Transaction", align: Align::Left },
    Column { id: "last_transaction_at", header: "Last Transaction", align: Align::Left },
];

/// Format a number with two decimals and thousands separators.
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

fn format_amount(value: Option<f64>, currency: Option<&str>) -> String {
    match (value, currency) {
        (Some(v), Some(code)) => format!("{} {}", format_number(v), code),
        (Some(v), None) => format_number(v),
        (None, _) => "-".to_string(),
    }
}

fn format_ratio(value: Option<f64>) -> String {
    value
        .map(|r| format!("{} %", format_number(r * 100.0)))
        .unwrap_or_else(|| "-".to_string())
}

/// Backend timestamps are naive UTC; show them as a local day.
fn format_date_short(s: &str, tz: &FixedOffset) -> String {
    let parsed = DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        });

    match parsed {
        Some(dt) => dt.with_timezone(tz).format("%d.%m.%Y").to_string(),
        None => s.to_string(),
    }
}

fn holding_cell(holding: &Holding, column: &Column, tz: &FixedOffset) -> String {
    let currency = holding.currency_code();
    match column.id {
        "ticker_code" => holding.ticker_code().unwrap_or("-").to_string(),
        "market_code" => holding.market_code().unwrap_or("-").to_string(),
        "investment_account" => holding.account_title().unwrap_or("-").to_string(),
        "status" => holding.status_label().to_string(),
        "total_buy_amount" => format_amount(holding.total_buy_amount, currency),
        "total_sell_amount" => format_amount(holding.total_sell_amount, currency),
        "pnl_amount" => format_amount(holding.pnl_amount, currency),
        "pnl_ratio" => format_ratio(holding.pnl_ratio),
        "first_transaction_at" => holding
            .first_transaction_at
            .as_deref()
            .map(|d| format_date_short(d, tz))
            .unwrap_or_else(|| "-".to_string()),
        "last_transaction_at" => holding
            .last_transaction_at
            .as_deref()
            .map(|d| format_date_short(d, tz))
            .unwrap_or_else(|| "-".to_string()),
        _ => String::new(),
    }
}

fn pad(text: &str, width: usize, align: Align) -> String {
    match align {
        Align::Left => format!("{:<width$}", text, width = width),
        Align::Right => format!("{:>width$}", text, width = width),
    }
}

fn style_cell(padded: String, column: &Column, holding: &Holding) -> String {
    match column.id {
        "status" if holding.is_completed.unwrap_or(false) => padded.dimmed().to_string(),
        "status" => padded.yellow().to_string(),
        "pnl_amount" | "pnl_ratio" => match holding.pnl_amount {
            Some(v) if v > 0.0 => padded.green().to_string(),
            Some(v) if v < 0.0 => padded.red().to_string(),
            _ => padded,
        },
        "ticker_code" => padded.bold().to_string(),
        _ => padded,
    }
}

/// Render holdings as an aligned table. Sorted columns get ▲/▼ in the header.
pub fn format_holdings_table(holdings: &[Holding], query: &HoldingsQuery, tz: &FixedOffset) -> String {
    let headers: Vec<String> = HOLDING_COLUMNS
        .iter()
        .map(|col| match query.is_sorted_by(col.id) {
            Some(true) => format!("{} ▼", col.header),
            Some(false) => format!("{} ▲", col.header),
            None => col.header.to_string(),
        })
        .collect();

    let cells: Vec<Vec<String>> = holdings
        .iter()
        .map(|h| HOLDING_COLUMNS.iter().map(|col| holding_cell(h, col, tz)).collect())
        .collect();

    let widths: Vec<usize> = HOLDING_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, _)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(headers[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(holdings.len() + 2);

    let header_line: Vec<String> = HOLDING_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, col)| pad(&headers[i], widths[i], col.align).bold().to_string())
        .collect();
    lines.push(header_line.join("  "));

    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    lines.push(rule.join("  ").dimmed().to_string());

    for (holding, row) in holdings.iter().zip(&cells) {
        let styled: Vec<String> = HOLDING_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, col)| style_cell(pad(&row[i], widths[i], col.align), col, holding))
            .collect();
        lines.push(styled.join("  ").trim_end().to_string());
    }

    lines.join("\n")
}

/// Format an investment account for TTY list display.
pub fn format_account_row(account: &InvestmentAccount) -> String {
    let id = account
        .id
        .map(|id| format!("#{}", id))
        .unwrap_or_default()
        .dimmed()
        .to_string();
    let title = account
        .title
        .as_deref()
        .unwrap_or("(untitled)")
        .bold()
        .to_string();
    let owner = account
        .owner
        .as_ref()
        .and_then(|o| o.full_name().or_else(|| o.email.clone()))
        .map(|o| format!(" ({})", o))
        .unwrap_or_default()
        .dimmed()
        .to_string();
    let inactive = if account.is_active == Some(false) {
        " [inactive]".red().to_string()
    } else {
        String::new()
    };

    format!("{} {}{}{}", id, title, owner, inactive)
}

/// Format a transaction for TTY list display.
pub fn format_transaction_row(tx: &Transaction, tz: &FixedOffset) -> String {
    let id = tx
        .id
        .map(|id| format!("#{}", id))
        .unwrap_or_default()
        .dimmed()
        .to_string();
    let date = tx
        .executed_at
        .as_deref()
        .map(|d| format_date_short(d, tz))
        .unwrap_or_default();
    let kind = tx.transaction_type.as_deref().unwrap_or("?").to_uppercase();
    let kind = if kind == "SELL" {
        kind.red().to_string()
    } else {
        kind.green().to_string()
    };
    let count = tx.count.map(format_number).unwrap_or_else(|| "-".to_string());
    let price = tx.price.map(format_number).unwrap_or_else(|| "-".to_string());
    let ticker = tx
        .ticker_id
        .map(|t| format!(" ticker #{}", t))
        .unwrap_or_default()
        .dimmed()
        .to_string();

    format!("{} {} {} {} @ {}{}", id, date, kind, count, price, ticker)
}

/// Greeting shown once a session is resolved.
pub fn format_greeting(session: &Session) -> String {
    let name = session.display_name().unwrap_or_else(|| "there".to_string());
    format!("Hi {}!", name.bold())
}
