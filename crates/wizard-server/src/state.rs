use std::sync::Arc;

use claude_client::Completer;
use wizard_core::config::{RunMode, WizardConfig};
use wizard_core::{Orchestrator, SessionStore};

/// Shared application state passed to all route handlers and sockets.
#[derive(Clone, Debug)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub mode: RunMode,
    /// Allowed CORS origin; any origin when `None`.
    pub frontend_url: Option<String>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, mode: RunMode) -> Self {
        Self {
            orchestrator,
            mode,
            frontend_url: None,
        }
    }

    /// State for a fresh, empty session store.
    pub fn from_config(config: &WizardConfig, completer: Arc<dyn Completer>) -> Self {
        let orchestrator = Orchestrator::new(Arc::new(SessionStore::new()), completer)
            .with_max_tokens(config.max_tokens);
        Self {
            orchestrator,
            mode: config.server.mode,
            frontend_url: config.server.frontend_url.clone(),
        }
    }

    pub fn with_frontend_url(mut self, url: impl Into<String>) -> Self {
        self.frontend_url = Some(url.into());
        self
    }

    pub fn store(&self) -> &SessionStore {
        self.orchestrator.store()
    }
}
