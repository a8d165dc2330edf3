// src/services/metrics_manager.rs
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::message::ClassificationResponse;

#[derive(Debug, Default, Clone, Serialize)]
pub struct MetricsData {
    pub category_usage: HashMap<String, u64>,
    pub model_usage: HashMap<String, u64>,
    pub relayed: u64,
    pub failed: u64,
}

#[derive(Debug, Clone)]
pub struct MetricsManager {
    inner: Arc<RwLock<MetricsData>>,
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsData::default())),
        }
    }

    /// Count a successful classification. Responses carrying `error` count
    /// as failures.
    pub async fn record_classification(&self, response: &ClassificationResponse) {
        let mut data = self.inner.write().await;
        if response.error.is_some() {
            data.failed += 1;
            return;
        }
        data.relayed += 1;
        *data.category_usage.entry(response.prediction.clone()).or_insert(0) += 1;
        let model = response.model_used.as_deref().unwrap_or("unknown");
        *data.model_usage.entry(model.to_string()).or_insert(0) += 1;
    }

    pub async fn record_failure(&self) {
        self.inner.write().await.failed += 1;
    }

    pub async fn get_metrics(&self) -> MetricsData {
        self.inner.read().await.clone()
    }
}
