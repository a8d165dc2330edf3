// src/services/controller.rs
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    chat_history::{ChatEntry, FailureNotice, HistorySink},
    renderer::{AgentReply, RenderOptions, render_result},
    router_client::RouterApi,
};
use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing to send; no entry appended, no request made.
    EmptyInput,
    /// Another submission is still in flight.
    Busy,
    Classified(AgentReply),
    Failed(FailureNotice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Submitting,
}

/// Resets the in-flight flag however the submission ends, including when
/// the submitting future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct TicketController {
    api: Arc<dyn RouterApi>,
    history: Arc<dyn HistorySink>,
    options: RenderOptions,
    submitting: AtomicBool,
    input: Mutex<String>,
}

impl TicketController {
    pub fn new(api: Arc<dyn RouterApi>, history: Arc<dyn HistorySink>) -> Self {
        Self::with_options(api, history, RenderOptions::default())
    }

    pub fn with_options(api: Arc<dyn RouterApi>, history: Arc<dyn HistorySink>, options: RenderOptions) -> Self {
        Self {
            api,
            history,
            options,
            submitting: AtomicBool::new(false),
            input: Mutex::new(String::new()),
        }
    }

    pub fn state(&self) -> ControllerState {
        if self.submitting.load(Ordering::Acquire) {
            ControllerState::Submitting
        } else {
            ControllerState::Idle
        }
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        *self.input.lock().await = text.into();
    }

    pub async fn input(&self) -> String {
        self.input.lock().await.clone()
    }

    /// Clears the input field only; history is untouched.
    pub async fn clear_input(&self) {
        self.input.lock().await.clear();
    }

    /// Submit whatever is currently in the input field.
    pub async fn submit_input(&self) -> SubmitOutcome {
        let text = self.input().await;
        self.submit(&text).await
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let Some(_in_flight) = InFlight::acquire(&self.submitting) else {
            warn!("submission ignored: a ticket is already being classified");
            return SubmitOutcome::Busy;
        };

        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::EmptyInput;
        }

        let submission_id = Uuid::new_v4();
        self.history.append(ChatEntry::user(text)).await;
        info!(%submission_id, chars = text.len(), "ticket submitted");

        match self.classify(text).await {
            Ok(reply) => {
                info!(
                    %submission_id,
                    category = %reply.category,
                    confidence = reply.confidence.value,
                    "ticket classified"
                );
                self.history.append(ChatEntry::reply(reply.clone())).await;
                self.clear_input().await;
                SubmitOutcome::Classified(reply)
            }
            Err(err) => {
                warn!(%submission_id, error = %err, "ticket classification failed");
                let notice = FailureNotice::new(err.to_string());
                self.history.append(ChatEntry::failure(notice.clone())).await;
                SubmitOutcome::Failed(notice)
            }
        }
    }

    async fn classify(&self, text: &str) -> Result<AgentReply, ClientError> {
        let response = self.api.classify(text).await?;
        if let Some(message) = response.error.as_deref() {
            return Err(ClientError::Logical(message.to_string()));
        }
        // A 2xx body without a category is malformed, not a success.
        if response.prediction.trim().is_empty() {
            return Err(ClientError::Decode("response carries no prediction".to_string()));
        }
        Ok(render_result(&response, self.options))
    }
}
