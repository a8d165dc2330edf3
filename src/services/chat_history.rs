// src/services/chat_history.rs
use std::{
    fmt::Debug,
    sync::Arc,
    time::Instant,
};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::renderer::AgentReply;

pub const FAILURE_GUIDANCE: &str = "Sorry, there was an error processing your request. \
Please check that the router service is running and try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryRole {
    User,
    Agent,
}

/// Agent-side notice for a failed submission. Transport and server-side
/// failures share this shape; only `message` differs.
#[derive(Clone, Debug, PartialEq)]
pub struct FailureNotice {
    pub message: String,
    pub guidance: &'static str,
}

impl FailureNotice {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), guidance: FAILURE_GUIDANCE }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntryBody {
    Text(String),
    Reply(AgentReply),
    Failure(FailureNotice),
}

#[derive(Clone, Debug)]
pub struct ChatEntry {
    pub id: Uuid,
    pub role: EntryRole,
    pub body: EntryBody,
    pub timestamp: Instant,
}

impl ChatEntry {
    fn new(role: EntryRole, body: EntryBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            body,
            timestamp: Instant::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(EntryRole::User, EntryBody::Text(text.into()))
    }

    pub fn reply(reply: AgentReply) -> Self {
        Self::new(EntryRole::Agent, EntryBody::Reply(reply))
    }

    pub fn failure(notice: FailureNotice) -> Self {
        Self::new(EntryRole::Agent, EntryBody::Failure(notice))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.body, EntryBody::Failure(_))
    }

    pub fn as_reply(&self) -> Option<&AgentReply> {
        match &self.body {
            EntryBody::Reply(reply) => Some(reply),
            _ => None,
        }
    }
}

/// Where rendered chat entries go. Append-only.
#[async_trait]
pub trait HistorySink: Send + Sync {
    /// Append an entry and return the new history length.
    async fn append(&self, entry: ChatEntry) -> usize;
}

/// In-memory history for one chat session.
#[derive(Clone, Default)]
pub struct ChatHistory {
    inner: Arc<RwLock<Vec<ChatEntry>>>,
}

impl Debug for ChatHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatHistory").finish_non_exhaustive()
    }
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the whole history, oldest first.
    pub async fn entries(&self) -> Vec<ChatEntry> {
        self.inner.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn last(&self) -> Option<ChatEntry> {
        self.inner.read().await.last().cloned()
    }

    /// Most recent successful reply, if any.
    pub async fn last_reply(&self) -> Option<AgentReply> {
        let guard = self.inner.read().await;
        guard.iter().rev().find_map(|e| e.as_reply().cloned())
    }

    pub async fn count_role(&self, role: EntryRole) -> usize {
        let guard = self.inner.read().await;
        guard.iter().filter(|e| e.role == role).count()
    }
}

#[async_trait]
impl HistorySink for ChatHistory {
    async fn append(&self, entry: ChatEntry) -> usize {
        let mut guard = self.inner.write().await;
        guard.push(entry);
        guard.len()
    }
}
