//! Scripted transport for exercising the client and engine without a network.
//!
//! `ScriptedTransport` replays queued outcomes in order, then repeats an
//! optional default outcome forever. Every request is recorded together with
//! the (tokio) instant it was sent, so backoff timing can be asserted under a
//! paused clock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use reia_models::chat::{ChatMessage, ChatRequest, ChatResponse, Choice};
use tokio::time::Instant;

use crate::error::ClientError;
use crate::transport::ChatTransport;

type Outcome = Result<ChatResponse, ClientError>;
type OutcomeFn = Box<dyn Fn(&ChatRequest) -> Outcome + Send + Sync>;

/// A request observed by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub request: ChatRequest,
    pub at: Instant,
}

pub struct ScriptedTransport {
    models: Option<Vec<String>>,
    queue: Mutex<VecDeque<Outcome>>,
    default: Option<OutcomeFn>,
    sent: Mutex<Vec<SentRequest>>,
    list_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedTransport {
    /// A transport whose catalog lists `models`.
    pub fn new(models: &[&str]) -> Self {
        Self {
            models: Some(models.iter().map(|m| m.to_string()).collect()),
            queue: Mutex::new(VecDeque::new()),
            default: None,
            sent: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// A transport whose model listing always fails.
    pub fn failing_listing() -> Self {
        Self {
            models: None,
            ..Self::new(&[])
        }
    }

    /// Outcome to produce once the queue is empty.
    pub fn with_default<F>(mut self, outcome: F) -> Self
    where
        F: Fn(&ChatRequest) -> Outcome + Send + Sync + 'static,
    {
        self.default = Some(Box::new(outcome));
        self
    }

    pub fn push(&self, outcome: Outcome) {
        lock(&self.queue).push_back(outcome);
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        lock(&self.sent).clone()
    }

    pub fn models_sent(&self) -> Vec<String> {
        lock(&self.sent)
            .iter()
            .map(|s| s.request.model.clone())
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn list_models(&self) -> Result<Vec<String>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.models
            .clone()
            .ok_or_else(|| ClientError::Transport("model listing unavailable".to_string()))
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
        lock(&self.sent).push(SentRequest {
            request: request.clone(),
            at: Instant::now(),
        });

        if let Some(outcome) = lock(&self.queue).pop_front() {
            return outcome;
        }
        match &self.default {
            Some(outcome) => outcome(request),
            None => Err(ClientError::Transport("script exhausted".to_string())),
        }
    }
}

/// A successful completion whose first choice carries `content`.
pub fn completion(content: &str) -> ChatResponse {
    ChatResponse {
        id: Some("chatcmpl-test".to_string()),
        model: "scripted".to_string(),
        choices: vec![Choice {
            index: 0,
            message: ChatMessage {
                role: "assistant".to_string(),
                content: content.to_string(),
            },
            finish_reason: Some("stop".to_string()),
        }],
        usage: None,
    }
}
