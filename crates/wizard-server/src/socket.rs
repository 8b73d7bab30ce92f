//! Wizard protocol spoken over `/ws`.
//!
//! Frames are JSON objects `{"event": "<name>", "data": {...}}`. A
//! [`Connection`] owns the session bound to one socket and handles its events
//! one at a time, so a socket never has two model calls in flight. Outgoing
//! events go through an unbounded channel drained by the socket's writer task.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;
use wizard_core::steps;
use wizard_core::types::{OutputKey, StepId};
use wizard_core::{Advance, StepEvent, WizardError};

use crate::sanitize::{retry_notice, step_error_message};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Wire events
// ---------------------------------------------------------------------------

/// Client → server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "wizard:start", rename_all = "camelCase")]
    Start { system_description: String },

    #[serde(rename = "step:execute", rename_all = "camelCase")]
    Execute {
        step_index: usize,
        #[serde(default)]
        feedback: Option<String>,
        #[serde(default)]
        session_id: Option<Uuid>,
    },

    #[serde(rename = "step:accept", rename_all = "camelCase")]
    Accept {
        step_index: usize,
        #[serde(default)]
        session_id: Option<Uuid>,
    },

    #[serde(rename = "step:revise", rename_all = "camelCase")]
    Revise {
        step_index: usize,
        feedback: String,
        #[serde(default)]
        session_id: Option<Uuid>,
    },
}

/// Server → client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "session:created", rename_all = "camelCase")]
    SessionCreated { session_id: Uuid },

    #[serde(rename = "step:started", rename_all = "camelCase")]
    StepStarted { step: StepId, step_index: usize },

    #[serde(rename = "step:retrying", rename_all = "camelCase")]
    StepRetrying {
        step: StepId,
        attempt: u32,
        max_retries: u32,
        delay_ms: u64,
        error: String,
    },

    #[serde(rename = "step:completed", rename_all = "camelCase")]
    StepCompleted {
        step: StepId,
        step_index: usize,
        output: String,
    },

    #[serde(rename = "step:error", rename_all = "camelCase")]
    StepError { step: StepId, error: String },

    #[serde(rename = "step:navigate", rename_all = "camelCase")]
    StepNavigate { target_step: usize },

    #[serde(rename = "step:cleared", rename_all = "camelCase")]
    StepCleared { step: OutputKey },

    #[serde(rename = "wizard:completed", rename_all = "camelCase")]
    WizardCompleted { session_id: Uuid },

    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerEvent {
    fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}

const SESSION_NOT_FOUND: &str = "Session not found";

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Per-socket protocol state.
pub struct Connection {
    app: AppState,
    session_id: Option<Uuid>,
    tx: UnboundedSender<ServerEvent>,
}

impl Connection {
    pub fn new(app: AppState, tx: UnboundedSender<ServerEvent>) -> Self {
        Self {
            app,
            session_id: None,
            tx,
        }
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    fn send(&self, event: ServerEvent) {
        // The writer only goes away when the socket closed; nothing to tell.
        let _ = self.tx.send(event);
    }

    /// Handle one text frame. Malformed frames produce an `error` event and
    /// leave the connection usable.
    pub async fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.handle(event).await,
            Err(e) => {
                tracing::debug!(error = %e, "malformed socket frame");
                self.send(ServerEvent::error(format!("Invalid message: {e}")));
            }
        }
    }

    pub async fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Start { system_description } => self.start(&system_description).await,
            ClientEvent::Execute {
                step_index,
                feedback,
                session_id,
            } => {
                if let Some(id) = self.resolve(session_id) {
                    self.execute(id, step_index, feedback.as_deref()).await;
                }
            }
            ClientEvent::Accept {
                step_index,
                session_id,
            } => {
                if let Some(id) = self.resolve(session_id) {
                    self.accept(id, step_index).await;
                }
            }
            ClientEvent::Revise {
                step_index,
                feedback,
                session_id,
            } => {
                if let Some(id) = self.resolve(session_id) {
                    self.revise(id, step_index, &feedback).await;
                }
            }
        }
    }

    /// Session named in the payload, else the one this socket started.
    /// Naming a session binds the socket to it.
    fn resolve(&mut self, requested: Option<Uuid>) -> Option<Uuid> {
        let id = requested.or(self.session_id);
        match id.filter(|id| self.app.store().get(*id).is_some()) {
            Some(id) => {
                self.session_id = Some(id);
                Some(id)
            }
            None => {
                self.send(ServerEvent::error(SESSION_NOT_FOUND));
                None
            }
        }
    }

    async fn start(&mut self, description: &str) {
        match self.app.orchestrator.start(description) {
            Ok(session) => {
                self.session_id = Some(session.id);
                self.send(ServerEvent::SessionCreated {
                    session_id: session.id,
                });
                self.execute(session.id, 0, None).await;
            }
            Err(e) => self.send(ServerEvent::error(e.to_string())),
        }
    }

    async fn execute(&self, id: Uuid, index: usize, feedback: Option<&str>) {
        let def = match steps::step(index) {
            Ok(def) => def,
            Err(e) => return self.send(ServerEvent::error(e.to_string())),
        };
        let mode = self.app.mode;
        let tx = self.tx.clone();
        let observer = move |event: StepEvent| {
            let out = match event {
                StepEvent::Started { index, .. } => ServerEvent::StepStarted {
                    step: def.id,
                    step_index: index,
                },
                StepEvent::Retrying {
                    attempt,
                    max_retries,
                    delay,
                    error,
                    ..
                } => ServerEvent::StepRetrying {
                    step: def.id,
                    attempt,
                    max_retries,
                    delay_ms: delay.as_millis() as u64,
                    error: retry_notice(mode, &error),
                },
            };
            let _ = tx.send(out);
        };

        match self
            .app
            .orchestrator
            .execute_step(id, index, feedback, &observer)
            .await
        {
            Ok(outcome) => self.send(ServerEvent::StepCompleted {
                step: outcome.step.id,
                step_index: outcome.index,
                output: outcome.output,
            }),
            Err(WizardError::SessionNotFound(_)) => {
                self.send(ServerEvent::error(SESSION_NOT_FOUND))
            }
            Err(e) => self.send(ServerEvent::StepError {
                step: def.id,
                error: step_error_message(mode, def.name, &e.to_string()),
            }),
        }
    }

    async fn accept(&self, id: Uuid, index: usize) {
        match self.app.orchestrator.accept(id, index) {
            Ok(Advance::Next(next)) => self.execute(id, next, None).await,
            Ok(Advance::Completed) => self.send(ServerEvent::WizardCompleted { session_id: id }),
            Err(e) => self.send_step_error(index, e),
        }
    }

    async fn revise(&self, id: Uuid, index: usize, feedback: &str) {
        let plan = match self.app.orchestrator.revise(id, index, feedback) {
            Ok(plan) => plan,
            Err(e) => return self.send_step_error(index, e),
        };
        if plan.target != index {
            self.send(ServerEvent::StepNavigate {
                target_step: plan.target,
            });
        }
        if let Some(key) = plan.cleared {
            self.send(ServerEvent::StepCleared { step: key });
        }
        self.execute(id, plan.target, Some(feedback)).await;
    }

    fn send_step_error(&self, index: usize, err: WizardError) {
        match steps::step(index) {
            Ok(def) => self.send(ServerEvent::StepError {
                step: def.id,
                error: err.to_string(),
            }),
            Err(_) => self.send(ServerEvent::error(err.to_string())),
        }
    }
}
