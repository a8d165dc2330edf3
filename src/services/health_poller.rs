// src/services/health_poller.rs
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    sync::{Mutex, RwLock, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use super::router_client::RouterApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthIndicator {
    /// No poll has completed yet.
    Unknown,
    Online,
    /// The service answered but did not report itself healthy.
    Offline,
    /// Transport failure or non-2xx answer.
    Error,
}

impl HealthIndicator {
    pub fn label(&self) -> &'static str {
        match self {
            HealthIndicator::Unknown => "checking",
            HealthIndicator::Online => "online",
            HealthIndicator::Offline => "offline",
            HealthIndicator::Error => "error",
        }
    }
}

#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn set_status(&self, indicator: HealthIndicator);
}

/// Latest indicator, readable by the front-end.
#[derive(Clone, Debug)]
pub struct StatusBoard {
    inner: Arc<RwLock<HealthIndicator>>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HealthIndicator::Unknown)) }
    }

    pub async fn current(&self) -> HealthIndicator {
        *self.inner.read().await
    }
}

#[async_trait]
impl StatusSink for StatusBoard {
    async fn set_status(&self, indicator: HealthIndicator) {
        *self.inner.write().await = indicator;
    }
}

pub struct HealthPoller {
    api: Arc<dyn RouterApi>,
    sink: Arc<dyn StatusSink>,
    interval: Duration,
    last: Mutex<Option<HealthIndicator>>,
    transitions: AtomicUsize,
}

impl HealthPoller {
    pub fn new(api: Arc<dyn RouterApi>, sink: Arc<dyn StatusSink>, interval: Duration) -> Self {
        Self { api, sink, interval, last: Mutex::new(None), transitions: AtomicUsize::new(0) }
    }

    /// Number of indicator changes seen so far; each one is logged once.
    pub fn transition_count(&self) -> usize {
        self.transitions.load(Ordering::Relaxed)
    }

    /// One health check. Never fails; every outcome maps to an indicator.
    pub async fn poll(&self) -> HealthIndicator {
        let indicator = match self.api.health().await {
            Ok(status) if status.is_healthy() => HealthIndicator::Online,
            Ok(status) => {
                debug!(status = %status.status, "router reported non-healthy status");
                HealthIndicator::Offline
            }
            Err(err) => {
                debug!(error = %err, "health check failed");
                HealthIndicator::Error
            }
        };

        let mut last = self.last.lock().await;
        if *last != Some(indicator) {
            match indicator {
                HealthIndicator::Online => info!("router agent is online"),
                other => warn!(status = other.label(), "router agent is not available"),
            }
            *last = Some(indicator);
            self.transitions.fetch_add(1, Ordering::Relaxed);
        }
        drop(last);

        self.sink.set_status(indicator).await;
        indicator
    }

    /// Polls immediately, then every `interval`, until `shutdown` flips to
    /// true or its sender is dropped.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.poll().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!("health poller stopped");
                            break;
                        }
                    }
                }
            }
        })
    }
}
