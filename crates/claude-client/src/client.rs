use async_trait::async_trait;

use crate::retry::RetryPolicy;
use crate::types::{ErrorEnvelope, MessagesRequest, MessagesResponse, WireMessage};
use crate::{ClaudeClientError, Completer, Completion, CompletionRequest, Result, RetryObserver};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// ─── ClaudeClient ─────────────────────────────────────────────────────────

/// Messages API client. Every call goes through the client's [`RetryPolicy`].
#[derive(Clone)]
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ClaudeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeClient")
            .field("api_key", &"<REDACTED>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ClaudeClient {
    /// Build a client. Fails with [`ClaudeClientError::MissingApiKey`] when the
    /// key is blank, before anything touches the network.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ClaudeClientError::MissingApiKey);
        }
        let model = model.into();
        tracing::debug!(model = %model, api_key_len = api_key.len(), "creating Claude client");
        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Point the client at a different API host (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One HTTP round trip, no retries.
    async fn send_once(&self, request: &CompletionRequest) -> Result<Completion> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: &request.system_prompt,
            messages: vec![WireMessage {
                role: "user",
                content: &request.user_prompt,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(env) if !env.error.kind.is_empty() => {
                    format!("{}: {}", env.error.kind, env.error.message)
                }
                Ok(env) => env.error.message,
                Err(_) => text,
            };
            return Err(ClaudeClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|source| ClaudeClientError::InvalidResponse { body: text, source })?;
        parsed.into_completion().ok_or(ClaudeClientError::EmptyResponse)
    }
}

#[async_trait]
impl Completer for ClaudeClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        request: CompletionRequest,
        observer: &dyn RetryObserver,
    ) -> Result<Completion> {
        let completion = self
            .retry
            .run(
                || self.send_once(&request),
                |attempt, err| observer.on_retry(attempt, err),
            )
            .await?;
        tracing::debug!(
            model = %self.model,
            input_tokens = completion.input_tokens,
            output_tokens = completion.output_tokens,
            stop_reason = completion.stop_reason.as_deref().unwrap_or(""),
            "completion received"
        );
        Ok(completion)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
