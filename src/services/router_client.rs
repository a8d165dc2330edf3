// src/services/router_client.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{
    error::ClientError,
    message::{ClassificationResponse, HealthStatus, PromptRequest},
};

pub const PROMPT_PATH: &str = "/api/prompt";
pub const HEALTH_PATH: &str = "/api/health";

/// The two endpoints the chat consumes.
#[async_trait]
pub trait RouterApi: Send + Sync {
    /// POST the ticket text. Returns the decoded body of a 2xx response,
    /// which may still carry an `error` field.
    async fn classify(&self, prompt: &str) -> Result<ClassificationResponse, ClientError>;

    async fn health(&self) -> Result<HealthStatus, ClientError>;
}

pub struct HttpRouterClient {
    http_client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpRouterClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout.as_secs())
        } else {
            ClientError::Transport(err)
        }
    }

    async fn decode<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RouterApi for HttpRouterClient {
    async fn classify(&self, prompt: &str) -> Result<ClassificationResponse, ClientError> {
        let url = self.url(PROMPT_PATH);
        tracing::debug!(%url, "sending ticket for classification");

        let response = self
            .http_client
            .post(&url)
            .json(&PromptRequest { prompt: prompt.to_string() })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.decode(response).await
    }

    async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self
            .http_client
            .get(self.url(HEALTH_PATH))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.decode(response).await
    }
}
