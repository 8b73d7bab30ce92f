//! `claude-client`: retry-wrapped client for the Anthropic Messages API.
//!
//! # Architecture
//!
//! ```text
//! CompletionRequest
//!     │
//!     ▼
//! Completer::complete     ← the seam the wizard talks to
//!     │
//!     ▼
//! RetryPolicy::run        ← fixed exponential backoff, observer per retry
//!     │
//!     ▼
//! ClaudeClient::send_once ← POST /v1/messages via reqwest
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use claude_client::{ClaudeClient, Completer, CompletionRequest, NoopObserver};
//!
//! let client = ClaudeClient::new(api_key, "claude-sonnet-4-5-20250929")?;
//! let out = client
//!     .complete(
//!         CompletionRequest {
//!             system_prompt: "You are terse.".into(),
//!             user_prompt: "Say hello.".into(),
//!             max_tokens: 256,
//!         },
//!         &NoopObserver,
//!     )
//!     .await?;
//! println!("{}", out.text);
//! ```

pub mod client;
pub mod error;
pub mod mock;
pub mod retry;
pub mod types;

use async_trait::async_trait;

pub use client::{ClaudeClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::{ClaudeClientError, TransportKind};
pub use mock::{MockCompleter, MockReply};
pub use retry::{RetryAttempt, RetryPolicy, Retryable};
pub use types::{Completion, CompletionRequest};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClaudeClientError>;

/// Told about every retry before the backoff sleep starts.
pub trait RetryObserver: Send + Sync {
    fn on_retry(&self, attempt: &RetryAttempt, error: &ClaudeClientError);
}

impl<F> RetryObserver for F
where
    F: Fn(&RetryAttempt, &ClaudeClientError) + Send + Sync,
{
    fn on_retry(&self, attempt: &RetryAttempt, error: &ClaudeClientError) {
        self(attempt, error)
    }
}

/// Observer for callers that do not care about retries.
pub struct NoopObserver;

impl RetryObserver for NoopObserver {
    fn on_retry(&self, _attempt: &RetryAttempt, _error: &ClaudeClientError) {}
}

/// Anything that can turn a prompt into model text.
///
/// Implemented by [`ClaudeClient`] for real calls and by [`MockCompleter`]
/// for tests and offline runs.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    async fn complete(
        &self,
        request: CompletionRequest,
        observer: &dyn RetryObserver,
    ) -> Result<Completion>;
}
