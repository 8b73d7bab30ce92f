pub mod config;
pub mod document;
pub mod error;
pub mod io;
pub mod orchestrator;
pub mod prompts;
pub mod session;
pub mod state;
pub mod steps;
pub mod store;
pub mod types;

pub use error::{Result, WizardError};
pub use orchestrator::{Orchestrator, Silent, StepEvent, StepObserver, StepOutcome};
pub use session::{Advance, RevisionPlan, Session};
pub use state::WizardState;
pub use store::SessionStore;
