use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a session is in the wizard.
///
/// Transitions: `Idle → StepRunning → ReadyForReview → (accept → Idle on the
/// next step | revise → StepRunning with feedback)`. A failed call lands in
/// `StepFailed`, from which the same step can run again. `Completed` and
/// `Abandoned` are final.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WizardState {
    /// Nothing running, nothing awaiting review; `current_step` is next.
    #[default]
    Idle,
    StepRunning {
        step: usize,
        revision: bool,
    },
    ReadyForReview {
        step: usize,
    },
    StepFailed {
        step: usize,
        error: String,
    },
    Completed,
    /// The run was quit before the last step was accepted.
    Abandoned,
}

impl WizardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardState::Idle => "idle",
            WizardState::StepRunning { .. } => "step_running",
            WizardState::ReadyForReview { .. } => "ready_for_review",
            WizardState::StepFailed { .. } => "step_failed",
            WizardState::Completed => "completed",
            WizardState::Abandoned => "abandoned",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, WizardState::Completed | WizardState::Abandoned)
    }

    /// Step currently running, awaiting review or failed.
    pub fn active_step(&self) -> Option<usize> {
        match self {
            WizardState::StepRunning { step, .. }
            | WizardState::ReadyForReview { step }
            | WizardState::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.active_step() {
            Some(step) => write!(f, "{}(step {})", self.as_str(), step),
            None => f.write_str(self.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_status_tag() {
        let v = serde_json::to_value(WizardState::ReadyForReview { step: 2 }).unwrap();
        assert_eq!(v["status"], "ready_for_review");
        assert_eq!(v["step"], 2);
    }

    #[test]
    fn display_includes_step() {
        assert_eq!(
            WizardState::StepRunning {
                step: 3,
                revision: false
            }
            .to_string(),
            "step_running(step 3)"
        );
        assert_eq!(WizardState::Completed.to_string(), "completed");
    }

    #[test]
    fn final_states() {
        assert!(WizardState::Completed.is_final());
        assert!(WizardState::Abandoned.is_final());
        assert!(!WizardState::Idle.is_final());
    }

    #[test]
    fn defaults_to_idle() {
        assert_eq!(WizardState::default(), WizardState::Idle);
        let s: WizardState = serde_json::from_str(r#"{"status":"idle"}"#).unwrap();
        assert_eq!(s, WizardState::default());
    }
}
