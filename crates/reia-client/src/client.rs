use std::sync::Arc;

use reia_models::chat::{ChatMessage, ChatRequest, ChatResponse};
use reia_models::config::{ApiConfig, ReiaConfig};
use tracing::{info, warn};

use crate::error::ClientError;
use crate::retry::{AttemptOutcome, FailureReason, RetryEvent, RetryMachine, RetryPolicy, RetryState};
use crate::selector::ModelSelector;
use crate::transport::{ChatTransport, HttpTransport};

/// Chat completion client that hides rate limits and model outages behind a
/// bounded retry loop.
///
/// The available-model catalog is fetched on first use and kept for the life
/// of the instance, together with the model-switch cursor.
pub struct CompletionClient {
    transport: Arc<dyn ChatTransport>,
    preferred_models: Vec<String>,
    fallback_models: Vec<String>,
    temperature: f64,
    max_tokens: u32,
    policy: RetryPolicy,
    selector: Option<ModelSelector>,
    catalog_is_fallback: bool,
}

impl CompletionClient {
    pub fn new(transport: Arc<dyn ChatTransport>, api: &ApiConfig, policy: RetryPolicy) -> Self {
        Self {
            transport,
            preferred_models: api.preferred_models.clone(),
            fallback_models: api.fallback_models.clone(),
            temperature: api.temperature,
            max_tokens: api.max_tokens,
            policy,
            selector: None,
            catalog_is_fallback: false,
        }
    }

    /// Build an HTTP-backed client. Fails when the API key is not set.
    pub fn from_config(config: &ReiaConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::from_env(&config.api)?;
        Ok(Self::new(
            Arc::new(transport),
            &config.api,
            RetryPolicy::from(&config.retry),
        ))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The selector, if the catalog has been fetched yet.
    pub fn selector(&self) -> Option<&ModelSelector> {
        self.selector.as_ref()
    }

    /// Models the service reported as available (fetched on first call).
    /// When the listing failed this is the configured fallback set; see
    /// [`Self::catalog_is_fallback`].
    pub async fn available_models(&mut self) -> &[String] {
        self.ensure_selector().await.available()
    }

    /// True when the catalog was not fetched from the service and the
    /// configured fallback models are assumed instead.
    pub fn catalog_is_fallback(&self) -> bool {
        self.catalog_is_fallback
    }

    async fn ensure_selector(&mut self) -> &mut ModelSelector {
        let selector = match self.selector.take() {
            Some(selector) => selector,
            None => {
                let available = match self.transport.list_models().await {
                    Ok(models) => {
                        info!(count = models.len(), models = ?models, "Fetched available models");
                        models
                    }
                    Err(e) => {
                        warn!(error = %e, fallback = ?self.fallback_models, "Could not list models, assuming fallback set");
                        self.catalog_is_fallback = true;
                        self.fallback_models.clone()
                    }
                };
                ModelSelector::new(self.preferred_models.clone(), available)
            }
        };
        self.selector.insert(selector)
    }

    /// Send one logical completion. When `model` is `None` the best available
    /// model is chosen.
    ///
    /// Rate limits are retried on the same model after a backoff; rejected
    /// models and transport failures move on to the next model immediately.
    pub async fn send_completion(
        &mut self,
        messages: &[ChatMessage],
        model: Option<&str>,
    ) -> Result<ChatResponse, ClientError> {
        let model = match model {
            Some(m) => m.to_string(),
            None => self
                .ensure_selector()
                .await
                .select_best()
                .ok_or(ClientError::NoModelAvailable)?,
        };

        let mut machine = RetryMachine::start(self.policy.clone(), model);
        let mut response: Option<ChatResponse> = None;
        let mut last_error: Option<ClientError> = None;

        loop {
            match machine.state().clone() {
                RetryState::Attempting { attempt, model } => {
                    info!(
                        model = %model,
                        attempt = attempt + 1,
                        max_attempts = self.policy.max_retries,
                        "Sending completion request"
                    );
                    let request = ChatRequest {
                        model,
                        messages: messages.to_vec(),
                        temperature: self.temperature,
                        max_tokens: self.max_tokens,
                    };
                    let result = self.transport.send(&request).await;
                    let outcome = AttemptOutcome::classify(&result);
                    match result {
                        Ok(r) => response = Some(r),
                        Err(e) => {
                            warn!(model = %request.model, attempt = attempt + 1, error = %e, "Completion attempt failed");
                            last_error = Some(e);
                        }
                    }
                    machine.advance(RetryEvent::Outcome(outcome));
                }
                RetryState::WaitingBackoff { model, delay, .. } => {
                    warn!(model = %model, delay_ms = delay.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(delay).await;
                    machine.advance(RetryEvent::BackoffElapsed);
                }
                RetryState::SwitchingModel { .. } => {
                    let next = self.ensure_selector().await.switch_to_next();
                    machine.advance(RetryEvent::ModelSwitched(next));
                }
                RetryState::Succeeded => {
                    return response.ok_or_else(|| {
                        ClientError::InvalidResponse("no response recorded".to_string())
                    });
                }
                RetryState::Failed(reason) => {
                    return Err(failure(reason, &machine, last_error));
                }
            }
        }
    }
}

fn failure(reason: FailureReason, machine: &RetryMachine, last_error: Option<ClientError>) -> ClientError {
    match (reason, last_error) {
        (FailureReason::Fatal, Some(e)) => e,
        (_, last_error) => {
            let error = ClientError::ExhaustedRetries {
                attempts: machine.attempts_made(),
                models: machine.tried_models().to_vec(),
                last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
            };
            warn!(reason = ?reason, error = %error, "Giving up on completion");
            error
        }
    }
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("preferred_models", &self.preferred_models)
            .field("policy", &self.policy)
            .field("selector", &self.selector)
            .finish()
    }
}
