#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// A self-contained test environment with an isolated data directory.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("data").join("monfaristo")).unwrap();
        TestEnv { dir }
    }

    /// Create a test environment with a saved session, as `login` leaves it.
    pub fn with_session(token: &str, email: &str) -> Self {
        let env = Self::new();
        let content = format!("api_token = \"{}\"\nemail = \"{}\"\n", token, email);
        std::fs::write(env.session_path(), content).unwrap();
        env
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data").join("monfaristo")
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir().join("session.toml")
    }

    pub fn write_config(&self, content: &str) {
        std::fs::write(self.data_dir().join("config.toml"), content).unwrap();
    }

    /// Get a Command configured to run monfaristo with this environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = assert_cmd::cargo_bin_cmd!("monfaristo");
        cmd.env("XDG_DATA_HOME", self.dir.path().join("data"));
        // Ensure no color codes pollute test output
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("MONFARISTO_TOKEN");
        cmd.env_remove("MONFARISTO_API_HOST");
        cmd.env_remove("MONFARISTO_LOG");
        cmd
    }

    /// Get a Command pointed at a mock API server.
    pub fn cmd_at(&self, api_host: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.args(["--api-host", api_host]);
        cmd
    }
}

/// Run a blocking assertion off the async test runtime.
pub async fn run_blocking<F, R>(f: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

pub fn holdings_fixture() -> serde_json::Value {
    serde_json::json!([
        {
            "id": 1,
            "ticker": {
                "id": 10,
                "code": "AAPL",
                "market": {"id": 2, "code": "NASDAQ", "currency": {"id": 1, "code": "USD"}}
            },
            "investment_account": {"id": 3, "title": "Main"},
            "total_buy_amount": 1500.0,
            "total_sell_amount": 1700.0,
            "is_completed": true,
            "pnl_amount": 195.5,
            "pnl_ratio": 0.1299,
            "first_transaction_at": "2024-01-15T10:00:00",
            "last_transaction_at": "2024-03-01T12:00:00"
        },
        {
            "id": 2,
            "ticker": {
                "id": 11,
                "code": "SAP",
                "market": {"id": 4, "code": "XETRA", "currency": {"id": 2, "code": "EUR"}}
            },
            "investment_account": {"id": 3, "title": "Main"},
            "total_buy_amount": 12000.0,
            "total_sell_amount": 0.0,
            "is_completed": false,
            "pnl_amount": null,
            "pnl_ratio": null,
            "first_transaction_at": "2024-02-10T08:30:00",
            "last_transaction_at": "2024-02-10T08:30:00"
        }
    ])
}
