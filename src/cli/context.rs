use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::FixedOffset;
use log::debug;

use crate::api::{ApiClient, ClientConfig, SessionResolver};
use crate::config::{AppConfig, API_HOST_ENV};
use crate::output::format::{detect_output_mode, OutputMode};

pub struct RunContext {
    pub output_mode: OutputMode,
    pub tz: FixedOffset,
    pub config: AppConfig,
    pub api_host: String,
}

impl RunContext {
    /// Create context from CLI arguments
    pub fn from_args(json: bool, no_color: bool, utc: bool, api_host: Option<&str>) -> Result<Self> {
        let config = AppConfig::load().context("Failed to load config.toml")?;
        Self::with_config(json, no_color, utc, api_host, config)
    }

    fn with_config(
        json: bool,
        no_color: bool,
        utc: bool,
        api_host: Option<&str>,
        config: AppConfig,
    ) -> Result<Self> {
        if no_color {
            colored::control::set_override(false);
        }

        let output_mode = detect_output_mode(json);
        let tz = if utc {
            FixedOffset::east_opt(0).context("UTC offset")?
        } else {
            *chrono::Local::now().offset()
        };

        let env_host = env::var(API_HOST_ENV).ok();
        let api_host = config.api_host(api_host, env_host.as_deref());
        debug!("API host: {}", api_host);

        Ok(RunContext {
            output_mode,
            tz,
            config,
            api_host,
        })
    }

    /// Build an API client for the configured host, authenticating through `credentials`.
    pub fn client(&self, credentials: Arc<dyn SessionResolver>) -> Result<ApiClient> {
        let config = ClientConfig::new(&self.api_host)
            .with_header("User-Agent", format!("monfaristo/{}", env!("MONFARISTO_VERSION")))
            .with_timeout(self.config.timeout())
            .with_slash_policy(self.config.slash_policy())
            .with_credentials(credentials);
        ApiClient::new(config).context("Failed to build HTTP client")
    }
}
