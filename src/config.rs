use anyhow::{bail, Result};
use std::time::Duration;

use crate::cli::Cli;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CHAT_PATH: &str = "/chat";
pub const DEFAULT_CONTACT_DELAY_MS: u64 = 1500;

/// Resolved runtime settings: `.env`, then environment, then CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub chat_path: String,
    pub contact_delay: Duration,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let api_url = cli.api_url.trim().to_string();
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            bail!("API url must start with http:// or https://, got {:?}", api_url);
        }

        let chat_path = cli.chat_path.trim();
        if chat_path.is_empty() {
            bail!("chat path must not be empty");
        }

        Ok(Self {
            api_url,
            chat_path: chat_path.to_string(),
            contact_delay: Duration::from_millis(cli.contact_delay_ms),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            contact_delay: Duration::from_millis(DEFAULT_CONTACT_DELAY_MS),
        }
    }
}
