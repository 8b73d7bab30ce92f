use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    ClaudeClientError, Completer, Completion, CompletionRequest, Result, RetryAttempt,
    RetryObserver, RetryPolicy,
};

/// One scripted reply for [`MockCompleter`].
#[derive(Debug)]
pub enum MockReply {
    Text(String),
    Fail(ClaudeClientError),
    /// Report `retries` transient API failures to the observer, then succeed.
    RetryThen { retries: u32, status: u16, text: String },
}

/// In-memory [`Completer`] that replays scripted replies and records every
/// request. When the script runs dry it answers `Generated response #n`.
pub struct MockCompleter {
    model: String,
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
    policy: RetryPolicy,
}

impl Default for MockCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCompleter {
    pub fn new() -> Self {
        Self {
            model: "mock-model".into(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let mock = Self::new();
        lock(&mock.script).extend(replies);
        mock
    }

    pub fn push(&self, reply: MockReply) {
        lock(&self.script).push_back(reply);
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn text_completion(text: String) -> Completion {
    Completion {
        input_tokens: 0,
        output_tokens: text.split_whitespace().count() as u64,
        stop_reason: Some("end_turn".into()),
        text,
    }
}

#[async_trait]
impl Completer for MockCompleter {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        request: CompletionRequest,
        observer: &dyn RetryObserver,
    ) -> Result<Completion> {
        let n = {
            let mut requests = lock(&self.requests);
            requests.push(request);
            requests.len()
        };
        let reply = lock(&self.script).pop_front();
        match reply {
            None => Ok(text_completion(format!("Generated response #{n}"))),
            Some(MockReply::Text(text)) => Ok(text_completion(text)),
            Some(MockReply::Fail(err)) => Err(err),
            Some(MockReply::RetryThen {
                retries,
                status,
                text,
            }) => {
                for retry in 0..retries {
                    let attempt = RetryAttempt {
                        attempt: retry + 1,
                        max_retries: self.policy.max_retries.max(retries),
                        delay: self.policy.delay_for(retry),
                    };
                    let err = ClaudeClientError::Api {
                        status,
                        message: "scripted transient failure".into(),
                    };
                    observer.on_retry(&attempt, &err);
                    tokio::task::yield_now().await;
                }
                Ok(text_completion(text))
            }
        }
    }
}
