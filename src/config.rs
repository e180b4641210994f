use anyhow::{bail, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// What happens when a plate that is already tracked is registered again.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReregistrationPolicy {
    /// Return the existing device untouched.
    #[default]
    Keep,
    /// Replace the stored display name.
    Rename,
    /// Fail with a validation error.
    Reject,
}

impl FromStr for ReregistrationPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "rename" => Ok(Self::Rename),
            "reject" => Ok(Self::Reject),
            other => bail!("unknown ARVENTO_REREGISTRATION policy '{}'", other),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub vendor_timeout_secs: u64,
    pub trackimo_api_url: String,
    pub trackimo_page_size: u32,
    pub trackimo_history_limit: u32,
    pub history_default_hours: i64,
    pub arvento_reregistration: ReregistrationPolicy,
    /// Connect Arvento to the bundled sample fleet regardless of the
    /// per-connect `offline` flag.
    pub arvento_offline: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            vendor_timeout_secs: 30,
            trackimo_api_url: "https://app.trackimo.com:443".to_string(),
            trackimo_page_size: 20,
            trackimo_history_limit: 100,
            history_default_hours: 24,
            arvento_reregistration: ReregistrationPolicy::Keep,
            arvento_offline: false,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default();

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = parse_or("PORT", defaults.port);
        let log_level = env::var("LOG_LEVEL").unwrap_or(defaults.log_level);
        let vendor_timeout_secs = parse_or("VENDOR_TIMEOUT_SECS", defaults.vendor_timeout_secs);
        let trackimo_api_url = env::var("TRACKIMO_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.trackimo_api_url);
        let trackimo_page_size = parse_or("TRACKIMO_PAGE_SIZE", defaults.trackimo_page_size);
        let trackimo_history_limit =
            parse_or("TRACKIMO_HISTORY_LIMIT", defaults.trackimo_history_limit);
        let history_default_hours =
            parse_or("HISTORY_DEFAULT_HOURS", defaults.history_default_hours);
        let arvento_reregistration = match env::var("ARVENTO_REREGISTRATION") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.arvento_reregistration,
        };
        let arvento_offline = parse_or("ARVENTO_OFFLINE", defaults.arvento_offline);

        Ok(Self {
            host,
            port,
            log_level,
            vendor_timeout_secs,
            trackimo_api_url,
            trackimo_page_size,
            trackimo_history_limit,
            history_default_hours,
            arvento_reregistration,
            arvento_offline,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn vendor_timeout(&self) -> Duration {
        Duration::from_secs(self.vendor_timeout_secs)
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}
