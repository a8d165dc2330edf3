// src/state.rs
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::Config;
use crate::services::metrics_manager::MetricsManager;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub http_client: Client,
    pub model_api_url: Option<String>,
    pub model_health_url: Option<String>,
    pub metrics: MetricsManager,
}

impl AppState {
    /// Fails if the HTTP client cannot be built; the upstream timeout is
    /// never silently dropped.
    pub fn new(model_api_url: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            model_api_url,
            model_health_url: None,
            metrics: MetricsManager::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let mut state = Self::new(config.model_api_url.clone(), config.request_timeout)?;
        state.model_health_url = config.model_health_url.clone();
        Ok(state)
    }

    pub fn with_health_url(mut self, url: impl Into<String>) -> Self {
        self.model_health_url = Some(url.into());
        self
    }
}
