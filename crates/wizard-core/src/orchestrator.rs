//! Drives sessions through the step sequence.
//!
//! The orchestrator owns no per-session state of its own: every decision is a
//! transition on the stored [`Session`], and the only `await` is the model
//! call, made with the store unlocked.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use claude_client::{ClaudeClientError, Completer, CompletionRequest, RetryAttempt};
use uuid::Uuid;

use crate::config::DEFAULT_MAX_TOKENS;
use crate::document;
use crate::error::{Result, WizardError};
use crate::prompts::Revision;
use crate::session::{Advance, RevisionPlan, Session};
use crate::steps::StepDefinition;
use crate::store::SessionStore;

// ---------------------------------------------------------------------------
// StepEvent / StepObserver
// ---------------------------------------------------------------------------

/// Progress reported while a step runs.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    Started {
        index: usize,
        revision: bool,
    },
    Retrying {
        index: usize,
        attempt: u32,
        max_retries: u32,
        delay: Duration,
        error: String,
    },
}

pub trait StepObserver: Send + Sync {
    fn on_event(&self, event: StepEvent);
}

impl<F> StepObserver for F
where
    F: Fn(StepEvent) + Send + Sync,
{
    fn on_event(&self, event: StepEvent) {
        self(event)
    }
}

/// Observer that drops every event.
pub struct Silent;

impl StepObserver for Silent {
    fn on_event(&self, _event: StepEvent) {}
}

/// A step that produced output and now awaits review.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub index: usize,
    pub step: &'static StepDefinition,
    pub output: String,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<SessionStore>,
    completer: Arc<dyn Completer>,
    max_tokens: u32,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("model", &self.model())
            .field("max_tokens", &self.inner.max_tokens)
            .field("sessions", &self.inner.store.len())
            .finish()
    }
}

impl Orchestrator {
    pub fn new(store: Arc<SessionStore>, completer: Arc<dyn Completer>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                completer,
                max_tokens: DEFAULT_MAX_TOKENS,
            }),
        }
    }

    pub fn with_max_tokens(self, max_tokens: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: Arc::clone(&self.inner.store),
                completer: Arc::clone(&self.inner.completer),
                max_tokens,
            }),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.inner.store
    }

    pub fn model(&self) -> &str {
        self.inner.completer.model()
    }

    pub fn session(&self, id: Uuid) -> Result<Session> {
        self.inner.store.require(id)
    }

    /// Create a session for `description`. Blank descriptions are rejected.
    pub fn start(&self, description: &str) -> Result<Session> {
        let description = description.trim();
        if description.is_empty() {
            return Err(WizardError::EmptyDescription);
        }
        let session = self.inner.store.create(description);
        tracing::info!(session = %session.id, description_len = description.len(), "wizard started");
        Ok(session)
    }

    /// Run step `index` once: begin, call the model, then finish or fail.
    ///
    /// Non-blank `feedback` makes this a revision, and the step's previous
    /// output (if any) goes into the prompt alongside it.
    pub async fn execute_step(
        &self,
        id: Uuid,
        index: usize,
        feedback: Option<&str>,
        observer: &dyn StepObserver,
    ) -> Result<StepOutcome> {
        let feedback = feedback.map(str::trim).filter(|f| !f.is_empty());
        let revision = feedback.is_some();

        let (def, description, outputs) = self.inner.store.update(id, |s| {
            let def = s.begin_step(index, revision)?;
            Ok((def, s.description.clone(), s.outputs.clone()))
        })?;

        let input = def.assemble_input(&description, &outputs);
        let user_prompt = def.user_prompt(
            &input,
            feedback.map(|feedback| Revision {
                feedback,
                previous: outputs.get(&def.output_key).map(String::as_str),
            }),
        );
        let request = CompletionRequest {
            system_prompt: def.prompt.system.to_string(),
            user_prompt,
            max_tokens: self.inner.max_tokens,
        };

        tracing::info!(
            session = %id,
            step = %def.id,
            index,
            revision,
            input_len = input.len(),
            prompt_len = request.user_prompt.len(),
            max_tokens = request.max_tokens,
            "executing step"
        );
        observer.on_event(StepEvent::Started { index, revision });

        let on_retry = |attempt: &RetryAttempt, error: &ClaudeClientError| {
            observer.on_event(StepEvent::Retrying {
                index,
                attempt: attempt.attempt,
                max_retries: attempt.max_retries,
                delay: attempt.delay,
                error: error.to_string(),
            });
        };

        let started = Instant::now();
        let result = self.inner.completer.complete(request, &on_retry).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(completion) => {
                tracing::info!(
                    session = %id,
                    step = %def.id,
                    elapsed_ms,
                    output_len = completion.text.len(),
                    output_tokens = completion.output_tokens,
                    stop_reason = completion.stop_reason.as_deref().unwrap_or("unknown"),
                    "step completed"
                );
                let output = completion.text;
                self.inner
                    .store
                    .update(id, |s| s.finish_step(index, output.clone()))?;
                Ok(StepOutcome {
                    index,
                    step: def,
                    output,
                })
            }
            Err(source) => {
                tracing::error!(
                    session = %id,
                    step = %def.id,
                    elapsed_ms,
                    retryable = claude_client::Retryable::is_retryable(&source),
                    error = %source,
                    "step failed"
                );
                self.inner
                    .store
                    .update(id, |s| s.fail_step(index, source.to_string()))?;
                Err(WizardError::StepFailed {
                    step: def.name.to_string(),
                    source,
                })
            }
        }
    }

    pub fn accept(&self, id: Uuid, index: usize) -> Result<Advance> {
        let advance = self.inner.store.update(id, |s| s.accept(index))?;
        tracing::info!(session = %id, index, ?advance, "step accepted");
        Ok(advance)
    }

    /// Prepare a revision of step `index`. The caller runs the returned
    /// target with the same feedback.
    pub fn revise(&self, id: Uuid, index: usize, feedback: &str) -> Result<RevisionPlan> {
        if feedback.trim().is_empty() {
            return Err(WizardError::EmptyFeedback);
        }
        let plan = self.inner.store.update(id, |s| s.revise(index))?;
        tracing::info!(
            session = %id,
            index,
            target = plan.target,
            cleared = plan.cleared.map(|k| k.as_str()),
            "revision requested"
        );
        Ok(plan)
    }

    pub fn quit(&self, id: Uuid) -> Result<Session> {
        let session = self.inner.store.update(id, |s| {
            s.quit();
            Ok(s.clone())
        })?;
        tracing::info!(session = %id, step = session.current_step, "wizard quit");
        Ok(session)
    }

    /// Combined markdown for the session as it stands now.
    pub fn document(&self, id: Uuid) -> Result<String> {
        let session = self.inner.store.require(id)?;
        Ok(document::render(&session, Utc::now()))
    }
}
