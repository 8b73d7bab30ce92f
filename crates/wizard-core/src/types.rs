use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// StepId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepId {
    BusinessAnalyst,
    RequirementsReviewer,
    TechnicalArchitect,
    TechnicalDesigner,
    TestingStrategist,
    TaskPlanner,
    SdlcTaskAllocator,
}

impl StepId {
    pub fn all() -> &'static [StepId] {
        &[
            StepId::BusinessAnalyst,
            StepId::RequirementsReviewer,
            StepId::TechnicalArchitect,
            StepId::TechnicalDesigner,
            StepId::TestingStrategist,
            StepId::TaskPlanner,
            StepId::SdlcTaskAllocator,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepId::BusinessAnalyst => "businessAnalyst",
            StepId::RequirementsReviewer => "requirementsReviewer",
            StepId::TechnicalArchitect => "technicalArchitect",
            StepId::TechnicalDesigner => "technicalDesigner",
            StepId::TestingStrategist => "testingStrategist",
            StepId::TaskPlanner => "taskPlanner",
            StepId::SdlcTaskAllocator => "sdlcTaskAllocator",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepId {
    type Err = crate::error::WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepId::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| crate::error::WizardError::UnknownStep(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// OutputKey
// ---------------------------------------------------------------------------

/// Where a step's text lands in the session's output map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputKey {
    Requirements,
    RequirementsReview,
    Architecture,
    TechnicalDesign,
    TestingStrategy,
    TaskPlanner,
    SdlcTaskAllocation,
}

impl OutputKey {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputKey::Requirements => "requirements",
            OutputKey::RequirementsReview => "requirementsReview",
            OutputKey::Architecture => "architecture",
            OutputKey::TechnicalDesign => "technicalDesign",
            OutputKey::TestingStrategy => "testingStrategy",
            OutputKey::TaskPlanner => "taskPlanner",
            OutputKey::SdlcTaskAllocation => "sdlcTaskAllocation",
        }
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputKey {
    type Err = crate::error::WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requirements" => Ok(OutputKey::Requirements),
            "requirementsReview" => Ok(OutputKey::RequirementsReview),
            "architecture" => Ok(OutputKey::Architecture),
            "technicalDesign" => Ok(OutputKey::TechnicalDesign),
            "testingStrategy" => Ok(OutputKey::TestingStrategy),
            "taskPlanner" => Ok(OutputKey::TaskPlanner),
            "sdlcTaskAllocation" => Ok(OutputKey::SdlcTaskAllocation),
            _ => Err(crate::error::WizardError::UnknownOutputKey(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ReviewDecision
// ---------------------------------------------------------------------------

/// What the human decided after reading a step's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReviewDecision {
    Accept,
    Revise { feedback: String },
    Quit,
}
