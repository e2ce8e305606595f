//! Workflow gating rules for step creation
//!
//! Corrugation and PrintingDetails run in parallel once paper stock is
//! pulled, but both must reach `accept` before any downstream step unlocks.
//! The functions here are pure decisions over an ordered plan view; loading
//! the inputs from the repositories is the application layer's job.

use crate::detail::StepDetail;
use crate::error::DomainError;
use crate::ids::StepId;
use crate::plan_graph::PlanGraph;
use crate::step::{PlanStep, StepKind};
use serde::{Deserialize, Serialize};

/// One unmet prerequisite reported back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRequirement {
    pub kind: StepKind,
    pub must_be_accepted: bool,
}

impl StepRequirement {
    /// The step type has no detail record yet
    pub fn missing(kind: StepKind) -> Self {
        Self {
            kind,
            must_be_accepted: false,
        }
    }

    /// The detail exists but has not been accepted
    pub fn acceptance(kind: StepKind) -> Self {
        Self {
            kind,
            must_be_accepted: true,
        }
    }
}

impl std::fmt::Display for StepRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.must_be_accepted {
            write!(f, "{} (must be accepted)", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

/// Outcome of a workflow validation
///
/// A negative decision is a normal value, not an error; only unknown
/// step/plan lookups fail. `required_steps` is `None` (not an empty list)
/// whenever `can_proceed` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDecision {
    pub can_proceed: bool,
    pub message: Option<String>,
    pub required_steps: Option<Vec<StepRequirement>>,
}

impl WorkflowDecision {
    pub fn approved() -> Self {
        Self {
            can_proceed: true,
            message: None,
            required_steps: None,
        }
    }

    pub fn approved_with(message: impl Into<String>) -> Self {
        Self {
            can_proceed: true,
            message: Some(message.into()),
            required_steps: None,
        }
    }

    pub fn blocked(message: impl Into<String>, required_steps: Vec<StepRequirement>) -> Self {
        Self {
            can_proceed: false,
            message: Some(message.into()),
            required_steps: Some(required_steps),
        }
    }
}

/// The gate that applies to the step about to be created
#[derive(Debug, Clone, PartialEq)]
pub enum GateRule {
    /// First step in the plan; no predecessor gate
    FirstStep,
    /// Corrugation and PrintingDetails must both exist for the job and be accepted
    CorrugationAndPrintingAccepted,
    /// A PaperStore detail must exist for the job; its status is irrelevant
    PaperStoreExists,
    /// The immediately preceding step's detail must exist and be accepted
    PreviousStepAccepted(PlanStep),
}

/// Select the gate for creating a detail of `kind` on the given step
///
/// # Errors
/// Returns `DomainError::NotFound` when the step does not belong to the
/// plan - a fatal lookup error, distinct from a negative decision.
pub fn gate_rule(graph: &PlanGraph, step_id: StepId, kind: StepKind) -> crate::Result<GateRule> {
    let position = graph
        .position(step_id)
        .ok_or_else(|| DomainError::NotFound(format!("job step {} not found", step_id)))?;

    if position == 0 {
        return Ok(GateRule::FirstStep);
    }

    if kind.requires_corrugation_and_printing() {
        return Ok(GateRule::CorrugationAndPrintingAccepted);
    }

    if kind.is_parallel_entry() {
        return Ok(GateRule::PaperStoreExists);
    }

    // position > 0, so the predecessor index is in bounds
    let prev = graph.steps()[position - 1].clone();
    Ok(GateRule::PreviousStepAccepted(prev))
}

/// Gate for {Punching, SideFlapPasting, QualityDept, DispatchProcess}
///
/// Both checks are evaluated independently and every unmet requirement is
/// accumulated, so the caller can report all missing prerequisites at once.
pub fn evaluate_gated_pair(
    corrugation: Option<&StepDetail>,
    printing: Option<&StepDetail>,
) -> WorkflowDecision {
    let mut required = Vec::new();
    let mut sentences = Vec::new();

    match corrugation {
        None => {
            required.push(StepRequirement::missing(StepKind::Corrugation));
            sentences.push("Corrugation step must be completed.");
        }
        Some(detail) if !detail.is_accepted() => {
            required.push(StepRequirement::acceptance(StepKind::Corrugation));
            sentences.push("Corrugation step must be accepted.");
        }
        Some(_) => {}
    }

    match printing {
        None => {
            required.push(StepRequirement::missing(StepKind::PrintingDetails));
            sentences.push("Printing step must be completed.");
        }
        Some(detail) if !detail.is_accepted() => {
            required.push(StepRequirement::acceptance(StepKind::PrintingDetails));
            sentences.push("Printing step must be accepted.");
        }
        Some(_) => {}
    }

    if required.is_empty() {
        WorkflowDecision::approved_with("Both Corrugation and Printing steps are accepted.")
    } else {
        WorkflowDecision::blocked(sentences.join(" "), required)
    }
}

/// Gate for {PrintingDetails, Corrugation}: existence of a PaperStore detail
/// for the job is enough, so the two steps can start concurrently
pub fn evaluate_parallel_entry(paper_store: Option<&StepDetail>) -> WorkflowDecision {
    match paper_store {
        Some(_) => WorkflowDecision::approved_with("PaperStore step is completed."),
        None => WorkflowDecision::blocked(
            "PaperStore step must be completed first.",
            vec![StepRequirement::missing(StepKind::PaperStore)],
        ),
    }
}

/// Default gate: the immediately preceding step's detail must be accepted
///
/// A missing detail and an unaccepted detail are distinct, user-visible
/// reasons and produce different messages.
pub fn evaluate_previous_step(
    prev: &PlanStep,
    prev_detail: Option<&StepDetail>,
) -> WorkflowDecision {
    match prev_detail {
        None => WorkflowDecision::blocked(
            format!("Previous step ({}) must be completed first.", prev.kind),
            vec![StepRequirement::missing(prev.kind)],
        ),
        Some(detail) if !detail.is_accepted() => WorkflowDecision::blocked(
            format!("Previous step ({}) must be accepted before proceeding.", prev.kind),
            vec![StepRequirement::acceptance(prev.kind)],
        ),
        Some(_) => {
            WorkflowDecision::approved_with(format!("Previous step ({}) is accepted.", prev.kind))
        }
    }
}
