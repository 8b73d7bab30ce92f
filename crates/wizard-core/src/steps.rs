//! The ordered step registry and the input each step is fed.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Result, WizardError};
use crate::prompts::{self, PromptTemplate, Revision};
use crate::types::{OutputKey, StepId};

/// Accumulated step outputs, keyed by where each step saves its text.
pub type Outputs = BTreeMap<OutputKey, String>;

// ---------------------------------------------------------------------------
// StepDefinition
// ---------------------------------------------------------------------------

pub struct StepDefinition {
    pub id: StepId,
    pub name: &'static str,
    pub prompt: PromptTemplate,
    pub output_key: OutputKey,
    /// Builds the prompt input from the description and earlier outputs.
    pub assemble: fn(&str, &Outputs) -> String,
    /// Revising this step re-runs another step instead of itself.
    pub revise_target: Option<StepId>,
    /// Whether the output belongs in the combined document.
    pub in_document: bool,
}

impl std::fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("output_key", &self.output_key)
            .field("revise_target", &self.revise_target)
            .field("in_document", &self.in_document)
            .finish_non_exhaustive()
    }
}

impl StepDefinition {
    pub fn assemble_input(&self, description: &str, outputs: &Outputs) -> String {
        (self.assemble)(description, outputs)
    }

    pub fn user_prompt(&self, input: &str, revision: Option<Revision<'_>>) -> String {
        self.prompt.user_prompt(input, revision)
    }

    /// File name used when the step output is written to disk.
    pub fn file_name(&self, index: usize) -> String {
        format!("{}-{}.md", index + 1, self.id)
    }

    pub fn info(&self, index: usize) -> StepInfo {
        StepInfo {
            index,
            id: self.id,
            name: self.name,
            agent: self.prompt.agent,
            output_key: self.output_key,
            revise_target: self.revise_target.and_then(index_of),
            in_document: self.in_document,
        }
    }
}

/// Serializable summary of a step for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInfo {
    pub index: usize,
    pub id: StepId,
    pub name: &'static str,
    pub agent: &'static str,
    pub output_key: OutputKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revise_target: Option<usize>,
    pub in_document: bool,
}

// ---------------------------------------------------------------------------
// Input assembly
// ---------------------------------------------------------------------------

fn output<'a>(outputs: &'a Outputs, key: OutputKey) -> &'a str {
    outputs.get(&key).map(String::as_str).unwrap_or("")
}

/// `=== LABEL ===` sections, in the given order.
fn sections(outputs: &Outputs, parts: &[(&str, OutputKey)]) -> String {
    parts
        .iter()
        .map(|(label, key)| format!("=== {label} ===\n\n{}", output(outputs, *key)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

const REQUIREMENTS: (&str, OutputKey) = ("REQUIREMENTS & USER STORIES", OutputKey::Requirements);
const REVIEW: (&str, OutputKey) = ("REQUIREMENTS REVIEW", OutputKey::RequirementsReview);
const ARCHITECTURE: (&str, OutputKey) = ("TECHNICAL ARCHITECTURE & STACK", OutputKey::Architecture);
const DESIGN: (&str, OutputKey) = (
    "TECHNICAL DESIGN & API SPECIFICATION",
    OutputKey::TechnicalDesign,
);
const TESTING: (&str, OutputKey) = ("TESTING STRATEGY", OutputKey::TestingStrategy);

fn description_input(description: &str, _: &Outputs) -> String {
    description.to_string()
}

fn requirements_input(_: &str, outputs: &Outputs) -> String {
    output(outputs, OutputKey::Requirements).to_string()
}

fn architect_input(_: &str, outputs: &Outputs) -> String {
    format!(
        "{}\n\n{}",
        output(outputs, OutputKey::Requirements),
        output(outputs, OutputKey::RequirementsReview)
    )
}

fn designer_input(_: &str, outputs: &Outputs) -> String {
    sections(outputs, &[REQUIREMENTS, REVIEW, ARCHITECTURE])
}

fn testing_input(_: &str, outputs: &Outputs) -> String {
    sections(outputs, &[REQUIREMENTS, REVIEW, ARCHITECTURE, DESIGN])
}

fn planner_input(_: &str, outputs: &Outputs) -> String {
    sections(outputs, &[REQUIREMENTS, REVIEW, ARCHITECTURE, DESIGN, TESTING])
}

fn allocator_input(description: &str, outputs: &Outputs) -> String {
    let parts = [
        ("PROJECT OVERVIEW", description),
        ("REQUIREMENTS & USER STORIES", output(outputs, OutputKey::Requirements)),
        (
            "REQUIREMENTS REVIEW & GAP ANALYSIS",
            output(outputs, OutputKey::RequirementsReview),
        ),
        ("SYSTEM ARCHITECTURE", output(outputs, OutputKey::Architecture)),
        (
            "TECHNICAL DESIGN SPECIFICATIONS",
            output(outputs, OutputKey::TechnicalDesign),
        ),
        ("TESTING STRATEGY", output(outputs, OutputKey::TestingStrategy)),
        (
            "TASK BREAKDOWN & IMPLEMENTATION ROADMAP",
            output(outputs, OutputKey::TaskPlanner),
        ),
    ];
    parts
        .iter()
        .map(|(title, body)| format!("# {title}\n\n{body}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

static STEPS: [StepDefinition; 7] = [
    StepDefinition {
        id: StepId::BusinessAnalyst,
        name: "Requirements & User Stories",
        prompt: prompts::BUSINESS_ANALYST,
        output_key: OutputKey::Requirements,
        assemble: description_input,
        revise_target: None,
        in_document: true,
    },
    StepDefinition {
        id: StepId::RequirementsReviewer,
        name: "Requirements Review",
        prompt: prompts::REQUIREMENTS_REVIEWER,
        output_key: OutputKey::RequirementsReview,
        assemble: requirements_input,
        revise_target: Some(StepId::BusinessAnalyst),
        in_document: false,
    },
    StepDefinition {
        id: StepId::TechnicalArchitect,
        name: "Technical Architecture & Stack",
        prompt: prompts::TECHNICAL_ARCHITECT,
        output_key: OutputKey::Architecture,
        assemble: architect_input,
        revise_target: None,
        in_document: true,
    },
    StepDefinition {
        id: StepId::TechnicalDesigner,
        name: "Technical Design & API Specification",
        prompt: prompts::TECHNICAL_DESIGNER,
        output_key: OutputKey::TechnicalDesign,
        assemble: designer_input,
        revise_target: None,
        in_document: true,
    },
    StepDefinition {
        id: StepId::TestingStrategist,
        name: "Testing Strategy",
        prompt: prompts::TESTING_STRATEGIST,
        output_key: OutputKey::TestingStrategy,
        assemble: testing_input,
        revise_target: None,
        in_document: true,
    },
    StepDefinition {
        id: StepId::TaskPlanner,
        name: "Task Planner & Implementation Plan",
        prompt: prompts::TASK_PLANNER,
        output_key: OutputKey::TaskPlanner,
        assemble: planner_input,
        revise_target: None,
        in_document: true,
    },
    StepDefinition {
        id: StepId::SdlcTaskAllocator,
        name: "SDLC Task Allocation",
        prompt: prompts::SDLC_TASK_ALLOCATOR,
        output_key: OutputKey::SdlcTaskAllocation,
        assemble: allocator_input,
        revise_target: None,
        in_document: true,
    },
];

/// All steps, in execution order.
pub fn registry() -> &'static [StepDefinition] {
    &STEPS
}

pub fn step(index: usize) -> Result<&'static StepDefinition> {
    STEPS.get(index).ok_or(WizardError::StepOutOfRange {
        index,
        total: STEPS.len(),
    })
}

pub fn index_of(id: StepId) -> Option<usize> {
    STEPS.iter().position(|s| s.id == id)
}

pub fn find(id: StepId) -> &'static StepDefinition {
    // Every StepId has exactly one registry entry (checked in tests).
    &STEPS[id as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_outputs() -> Outputs {
        let mut o = Outputs::new();
        o.insert(OutputKey::Requirements, "REQ".into());
        o.insert(OutputKey::RequirementsReview, "REV".into());
        o.insert(OutputKey::Architecture, "ARCH".into());
        o.insert(OutputKey::TechnicalDesign, "DESIGN".into());
        o.insert(OutputKey::TestingStrategy, "TEST".into());
        o.insert(OutputKey::TaskPlanner, "PLAN".into());
        o
    }

    #[test]
    fn registry_order_matches_step_ids() {
        let ids: Vec<StepId> = registry().iter().map(|s| s.id).collect();
        assert_eq!(ids, StepId::all());
        for id in StepId::all() {
            assert_eq!(find(*id).id, *id);
        }
    }

    #[test]
    fn output_keys_are_unique() {
        let mut keys: Vec<OutputKey> = registry().iter().map(|s| s.output_key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), registry().len());
    }

    #[test]
    fn first_step_reads_description() {
        let s = step(0).unwrap();
        assert_eq!(s.assemble_input("todo app", &Outputs::new()), "todo app");
    }

    #[test]
    fn architect_joins_requirements_and_review() {
        let s = find(StepId::TechnicalArchitect);
        assert_eq!(s.assemble_input("", &full_outputs()), "REQ\n\nREV");
    }

    #[test]
    fn designer_uses_labelled_sections() {
        let input = find(StepId::TechnicalDesigner).assemble_input("", &full_outputs());
        assert_eq!(
            input,
            "=== REQUIREMENTS & USER STORIES ===\n\nREQ\n\n\
             === REQUIREMENTS REVIEW ===\n\nREV\n\n\
             === TECHNICAL ARCHITECTURE & STACK ===\n\nARCH"
        );
    }

    #[test]
    fn planner_sees_everything_before_it() {
        let input = find(StepId::TaskPlanner).assemble_input("", &full_outputs());
        for part in ["REQ", "REV", "ARCH", "DESIGN", "TEST"] {
            assert!(input.contains(part), "missing {part}");
        }
        assert!(!input.contains("PLAN"));
    }

    #[test]
    fn allocator_includes_description_and_all_outputs() {
        let input = find(StepId::SdlcTaskAllocator).assemble_input("A shop", &full_outputs());
        assert!(input.starts_with("# PROJECT OVERVIEW\n\nA shop"));
        assert!(input.ends_with("# TASK BREAKDOWN & IMPLEMENTATION ROADMAP\n\nPLAN"));
    }

    #[test]
    fn missing_outputs_assemble_as_empty() {
        let input = find(StepId::TechnicalArchitect).assemble_input("", &Outputs::new());
        assert_eq!(input, "\n\n");
    }

    #[test]
    fn review_step_revises_business_analyst() {
        let s = find(StepId::RequirementsReviewer);
        assert_eq!(s.revise_target, Some(StepId::BusinessAnalyst));
        assert!(!s.in_document);
        assert_eq!(s.info(1).revise_target, Some(0));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        assert!(matches!(
            step(7),
            Err(WizardError::StepOutOfRange { index: 7, total: 7 })
        ));
    }

    #[test]
    fn file_name_is_one_based() {
        assert_eq!(step(0).unwrap().file_name(0), "1-businessAnalyst.md");
        assert_eq!(step(6).unwrap().file_name(6), "7-sdlcTaskAllocator.md");
    }
}
