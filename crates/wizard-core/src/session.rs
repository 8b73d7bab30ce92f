use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, WizardError};
use crate::state::WizardState;
use crate::steps::{self, Outputs, StepDefinition};
use crate::types::OutputKey;

/// One run of the wizard: a description plus every output produced so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    #[serde(rename = "systemDescription")]
    pub description: String,
    #[serde(default)]
    pub outputs: Outputs,
    /// Index of the step running, under review, or next to run.
    #[serde(default)]
    pub current_step: usize,
    #[serde(default)]
    pub state: WizardState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of accepting a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Completed,
}

/// Which step a revision re-runs, and which output it dropped on the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionPlan {
    pub target: usize,
    pub cleared: Option<OutputKey>,
}

impl Session {
    pub fn new(description: impl Into<String>) -> Self {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            description: description.into(),
            outputs: Outputs::new(),
            current_step: 0,
            state: WizardState::Idle,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn output(&self, key: OutputKey) -> Option<&str> {
        self.outputs.get(&key).map(String::as_str)
    }

    pub fn step_output(&self, index: usize) -> Result<Option<&str>> {
        Ok(self.output(steps::step(index)?.output_key))
    }

    pub fn is_completed(&self) -> bool {
        self.state == WizardState::Completed
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // -----------------------------------------------------------------------
    // Transitions
    //
    // Each one validates first and mutates only on success, so a rejected
    // call leaves the session untouched.
    // -----------------------------------------------------------------------

    pub fn begin_step(&mut self, index: usize, revision: bool) -> Result<&'static StepDefinition> {
        let def = steps::step(index)?;
        if let WizardState::StepRunning { step, .. } = self.state {
            return Err(WizardError::StepInFlight {
                step: steps::registry()[step].name.to_string(),
            });
        }
        if self.state.is_final() {
            return Err(self.invalid("begin_step", "session is finished"));
        }
        if index > self.current_step {
            return Err(self.invalid(
                "begin_step",
                format!("step {index} has not been reached (current step is {})", self.current_step),
            ));
        }
        if let Some(missing) = steps::registry()[..index]
            .iter()
            .find(|s| !self.outputs.contains_key(&s.output_key))
        {
            return Err(self.invalid(
                "begin_step",
                format!("'{}' has no output yet", missing.name),
            ));
        }

        self.current_step = index;
        self.state = WizardState::StepRunning {
            step: index,
            revision,
        };
        Ok(def)
    }

    pub fn finish_step(&mut self, index: usize, output: String) -> Result<()> {
        self.expect_running(index, "finish_step")?;
        let def = steps::step(index)?;
        self.outputs.insert(def.output_key, output);
        self.state = WizardState::ReadyForReview { step: index };
        Ok(())
    }

    /// Prior outputs stay as they were; the step may be run again.
    pub fn fail_step(&mut self, index: usize, error: impl Into<String>) -> Result<()> {
        self.expect_running(index, "fail_step")?;
        self.state = WizardState::StepFailed {
            step: index,
            error: error.into(),
        };
        Ok(())
    }

    pub fn accept(&mut self, index: usize) -> Result<Advance> {
        if self.state != (WizardState::ReadyForReview { step: index }) {
            return Err(self.invalid(
                "accept",
                format!("step {index} is not awaiting review"),
            ));
        }
        let total = steps::registry().len();
        if index + 1 >= total {
            self.current_step = total;
            self.state = WizardState::Completed;
            Ok(Advance::Completed)
        } else {
            self.current_step = index + 1;
            self.state = WizardState::Idle;
            Ok(Advance::Next(index + 1))
        }
    }

    pub fn revise(&mut self, index: usize) -> Result<RevisionPlan> {
        let reviewable = match &self.state {
            WizardState::ReadyForReview { step } | WizardState::StepFailed { step, .. } => {
                *step == index
            }
            _ => false,
        };
        if !reviewable {
            return Err(self.invalid(
                "revise",
                format!("step {index} is not awaiting review"),
            ));
        }
        let def = steps::step(index)?;

        let plan = match def.revise_target.and_then(steps::index_of) {
            Some(target) => {
                self.outputs.remove(&def.output_key);
                RevisionPlan {
                    target,
                    cleared: Some(def.output_key),
                }
            }
            None => RevisionPlan {
                target: index,
                cleared: None,
            },
        };
        self.current_step = plan.target;
        self.state = WizardState::Idle;
        Ok(plan)
    }

    pub fn quit(&mut self) {
        self.state = WizardState::Abandoned;
    }

    fn expect_running(&self, index: usize, action: &str) -> Result<()> {
        match self.state {
            WizardState::StepRunning { step, .. } if step == index => Ok(()),
            _ => Err(self.invalid(action, format!("step {index} is not running"))),
        }
    }

    fn invalid(&self, action: &str, reason: impl Into<String>) -> WizardError {
        WizardError::InvalidTransition {
            from: self.state.to_string(),
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}
