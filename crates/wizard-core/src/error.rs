use thiserror::Error;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("system description is required")]
    EmptyDescription,

    #[error("revision feedback is required")]
    EmptyFeedback,

    #[error("step index {index} out of range (wizard has {total} steps)")]
    StepOutOfRange { index: usize, total: usize },

    #[error("unknown step: {0}")]
    UnknownStep(String),

    #[error("unknown output key: {0}")]
    UnknownOutputKey(String),

    #[error("invalid transition from {from} on {action}: {reason}")]
    InvalidTransition {
        from: String,
        action: String,
        reason: String,
    },

    #[error("step '{step}' is still running")]
    StepInFlight { step: String },

    #[error("invalid mode '{0}': expected 'development' or 'production'")]
    InvalidMode(String),

    #[error("Failed to execute {step}: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: claude_client::ClaudeClientError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WizardError>;
