// src/config.rs
use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::error::ConfigError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_ROUTER_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HEALTH_POLL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub model_api_url: Option<String>,
    pub model_health_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub router_base_url: String,
    pub request_timeout: Duration,
    pub health_poll_interval: Duration,
    pub legacy_model_guess: bool,
}

impl Config {
    /// Read settings from the process environment. Call `dotenvy::dotenv()`
    /// first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_or(get("BIND_ADDR"), "BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?;
        let request_timeout = parse_or(
            get("REQUEST_TIMEOUT_SECS"),
            "REQUEST_TIMEOUT_SECS",
            Some(DEFAULT_REQUEST_TIMEOUT_SECS),
        )?;
        let health_poll = parse_or(
            get("HEALTH_POLL_SECS"),
            "HEALTH_POLL_SECS",
            Some(DEFAULT_HEALTH_POLL_SECS),
        )?;
        if health_poll == 0 {
            return Err(ConfigError::Invalid { key: "HEALTH_POLL_SECS", value: "0".to_string() });
        }
        let legacy_model_guess = parse_or(get("LEGACY_MODEL_GUESS"), "LEGACY_MODEL_GUESS", Some(false))?;

        let model_api_url = get("MODEL_API_URL").map(|u| validate_url("MODEL_API_URL", u)).transpose()?;
        let model_health_url = get("MODEL_HEALTH_URL")
            .map(|u| validate_url("MODEL_HEALTH_URL", u))
            .transpose()?;
        let router_base_url = validate_url(
            "ROUTER_BASE_URL",
            get("ROUTER_BASE_URL").unwrap_or_else(|| DEFAULT_ROUTER_BASE_URL.to_string()),
        )?;

        Ok(Self {
            model_api_url,
            model_health_url,
            bind_addr,
            static_dir: get("STATIC_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("static")),
            router_base_url: router_base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(request_timeout),
            health_poll_interval: Duration::from_secs(health_poll),
            legacy_model_guess,
        })
    }

    pub fn require_model_api_url(&self) -> Result<&str, ConfigError> {
        self.model_api_url.as_deref().ok_or(ConfigError::Missing("MODEL_API_URL"))
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &'static str, default: Option<T>) -> Result<T, ConfigError> {
    match raw {
        Some(value) => {
            let parsed = value.trim().parse();
            parsed.map_err(|_| ConfigError::Invalid { key, value })
        }
        None => default.ok_or(ConfigError::Missing(key)),
    }
}

fn validate_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    match reqwest::Url::parse(value.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(value.trim().to_string()),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}
