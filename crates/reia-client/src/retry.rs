//! Retry state machine for a single logical completion.
//!
//! The machine is pure: it never sleeps or performs I/O. The client drives it
//! by performing whatever the current [`RetryState`] asks for and feeding the
//! result back as a [`RetryEvent`].
//!
//! The policy is asymmetric. A rate limit waits and retries the same model;
//! a rejected model or a transport failure switches model immediately. Every
//! attempt counts against `max_retries`, and nothing waits after the last one.

use std::time::Duration;

use reia_models::config::RetryConfig;

use crate::error::ClientError;

/// Upper bound on any single wait unless configured otherwise.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Attempt bound, backoff unit and the longest wait allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, Duration::from_secs(config.base_delay_seconds))
            .with_max_backoff(Duration::from_secs(config.max_backoff_seconds))
    }
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            base_delay,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Wait before retrying after a rate limit on attempt `attempt` (0-indexed).
    /// A server-provided hint wins over `base_delay * (attempt + 1)`; either is
    /// capped at `max_backoff`.
    pub fn backoff_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = retry_after
            .unwrap_or_else(|| self.base_delay.saturating_mul(attempt.saturating_add(1)));
        delay.min(self.max_backoff)
    }
}

/// How a single attempt ended, as far as the retry policy cares.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success,
    RateLimited { retry_after: Option<Duration> },
    ModelRejected,
    TransportFailed,
    /// Retrying cannot help (e.g. bad credentials).
    Fatal,
}

impl AttemptOutcome {
    pub fn classify<T>(result: &Result<T, ClientError>) -> Self {
        match result {
            Ok(_) => AttemptOutcome::Success,
            Err(ClientError::RateLimited { retry_after }) => AttemptOutcome::RateLimited {
                retry_after: *retry_after,
            },
            Err(ClientError::ModelUnavailable { .. }) => AttemptOutcome::ModelRejected,
            Err(
                ClientError::Transport(_)
                | ClientError::Timeout(_)
                | ClientError::InvalidResponse(_),
            ) => AttemptOutcome::TransportFailed,
            Err(
                ClientError::Unauthorized(_)
                | ClientError::NotConfigured(_)
                | ClientError::NoModelAvailable
                | ClientError::ExhaustedRetries { .. },
            ) => AttemptOutcome::Fatal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Every allowed attempt was used.
    Exhausted,
    /// A model switch was needed but the selector had nothing left.
    NoFallbackModel,
    /// The last outcome was not retryable.
    Fatal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryState {
    /// Issue attempt `attempt` (0-indexed) against `model`.
    Attempting { attempt: u32, model: String },
    /// Sleep for `delay`, then make attempt `attempt` against the same model.
    WaitingBackoff {
        attempt: u32,
        model: String,
        delay: Duration,
    },
    /// Ask the selector for another model, then make attempt `attempt`.
    SwitchingModel { attempt: u32 },
    Succeeded,
    Failed(FailureReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryEvent {
    Outcome(AttemptOutcome),
    BackoffElapsed,
    ModelSwitched(Option<String>),
}

#[derive(Debug, Clone)]
pub struct RetryMachine {
    policy: RetryPolicy,
    state: RetryState,
    attempts_made: u32,
    tried: Vec<String>,
}

impl RetryMachine {
    pub fn start(policy: RetryPolicy, model: String) -> Self {
        Self {
            policy,
            state: RetryState::Attempting {
                attempt: 0,
                model: model.clone(),
            },
            attempts_made: 0,
            tried: vec![model],
        }
    }

    pub fn state(&self) -> &RetryState {
        &self.state
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Distinct models attempted so far, in first-use order.
    pub fn tried_models(&self) -> &[String] {
        &self.tried
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, RetryState::Succeeded | RetryState::Failed(_))
    }

    /// Apply an event. Events that do not fit the current state leave it unchanged.
    pub fn advance(&mut self, event: RetryEvent) -> &RetryState {
        let next = match (&self.state, event) {
            (RetryState::Attempting { attempt, model }, RetryEvent::Outcome(outcome)) => {
                self.attempts_made += 1;
                let next_attempt = attempt + 1;
                let has_budget = next_attempt < self.policy.max_retries;
                match outcome {
                    AttemptOutcome::Success => RetryState::Succeeded,
                    AttemptOutcome::Fatal => RetryState::Failed(FailureReason::Fatal),
                    AttemptOutcome::RateLimited { retry_after } if has_budget => {
                        RetryState::WaitingBackoff {
                            attempt: next_attempt,
                            model: model.clone(),
                            delay: self.policy.backoff_delay(*attempt, retry_after),
                        }
                    }
                    AttemptOutcome::ModelRejected | AttemptOutcome::TransportFailed
                        if has_budget =>
                    {
                        RetryState::SwitchingModel {
                            attempt: next_attempt,
                        }
                    }
                    _ => RetryState::Failed(FailureReason::Exhausted),
                }
            }
            (RetryState::WaitingBackoff { attempt, model, .. }, RetryEvent::BackoffElapsed) => {
                RetryState::Attempting {
                    attempt: *attempt,
                    model: model.clone(),
                }
            }
            (RetryState::SwitchingModel { attempt }, RetryEvent::ModelSwitched(Some(model))) => {
                if !self.tried.contains(&model) {
                    self.tried.push(model.clone());
                }
                RetryState::Attempting {
                    attempt: *attempt,
                    model,
                }
            }
            (RetryState::SwitchingModel { .. }, RetryEvent::ModelSwitched(None)) => {
                RetryState::Failed(FailureReason::NoFallbackModel)
            }
            (state, _) => state.clone(),
        };
        self.state = next;
        &self.state
    }
}
