#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum::Router;
use callcenter_chat::{
    error::ClientError,
    message::{ClassificationResponse, HealthStatus},
    services::router_client::RouterApi,
};
use tokio::sync::Notify;

#[derive(Clone)]
pub enum Script {
    Respond(ClassificationResponse),
    FailStatus(u16),
    FailTimeout,
}

impl Script {
    fn play(&self) -> Result<ClassificationResponse, ClientError> {
        match self {
            Script::Respond(resp) => Ok(resp.clone()),
            Script::FailStatus(code) => Err(ClientError::Status(*code)),
            Script::FailTimeout => Err(ClientError::Timeout(30)),
        }
    }
}

/// In-process stand-in for the router agent.
pub struct FakeApi {
    pub classify_calls: AtomicUsize,
    pub health_calls: AtomicUsize,
    script: Mutex<Script>,
    health: Mutex<Result<String, u16>>,
    prompts: Mutex<Vec<String>>,
    gated: bool,
    pub started: Notify,
    pub release: Notify,
}

impl FakeApi {
    pub fn new(script: Script) -> Self {
        Self {
            classify_calls: AtomicUsize::new(0),
            health_calls: AtomicUsize::new(0),
            script: Mutex::new(script),
            health: Mutex::new(Ok(HealthStatus::HEALTHY.to_string())),
            prompts: Mutex::new(Vec::new()),
            gated: false,
            started: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn responding(resp: ClassificationResponse) -> Self {
        Self::new(Script::Respond(resp))
    }

    /// Classify calls block until `release` is notified.
    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub fn with_health(self, health: Result<&str, u16>) -> Self {
        self.set_health(health);
        self
    }

    pub fn set_health(&self, health: Result<&str, u16>) {
        *self.health.lock().unwrap() = health.map(str::to_string);
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    pub fn calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    /// Prompts received by `classify`, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl RouterApi for FakeApi {
    async fn classify(&self, prompt: &str) -> Result<ClassificationResponse, ClientError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.started.notify_one();
        if self.gated {
            self.release.notified().await;
        }
        let script = self.script.lock().unwrap().clone();
        script.play()
    }

    async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        let health = self.health.lock().unwrap().clone();
        health.map(|status| HealthStatus { status }).map_err(ClientError::Status)
    }
}

pub fn billing() -> ClassificationResponse {
    ClassificationResponse {
        prediction: "billing".to_string(),
        confidence: Some(0.93),
        model_used: Some("transformer".to_string()),
        ..Default::default()
    }
}

/// Serves `router` on an ephemeral local port.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
