//! Job completion evaluation and the archival snapshot
//!
//! A job is ready for completion when some step has reached lifecycle
//! `stop` and its attached DispatchProcess detail is accepted. Completion
//! assembles an immutable snapshot of the whole job for archival; the
//! storage layer persists it atomically with the deletion of the live plan.

use crate::detail::{AcceptanceStatus, StepDetail};
use crate::ids::{JobNo, PlanId, SnapshotId, StepId, UserId};
use crate::job::{Job, PurchaseOrder};
use crate::plan::{JobDemand, JobPlan};
use crate::plan_graph::PlanGraph;
use crate::step::{PlanStep, StepKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reason reported when no step satisfies the completion predicate
pub const NOT_READY_REASON: &str = "No step with status \"stop\" and dispatch process accepted";

/// Result of the completion readiness check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReadiness {
    pub is_ready: bool,
    pub matched_step: Option<PlanStep>,
    pub reason: Option<String>,
}

impl CompletionReadiness {
    pub fn ready(matched_step: PlanStep) -> Self {
        Self {
            is_ready: true,
            matched_step: Some(matched_step),
            reason: None,
        }
    }

    pub fn not_ready() -> Self {
        Self {
            is_ready: false,
            matched_step: None,
            reason: Some(NOT_READY_REASON.to_string()),
        }
    }
}

/// Find the first step (in `step_no` ascending order) whose lifecycle is
/// `stop` and whose DispatchProcess detail is accepted
///
/// The predicate is existential; iteration order is pinned to the graph's
/// ordering so the result is deterministic when more than one step matches.
pub fn find_completion_step<'a>(
    graph: &'a PlanGraph,
    dispatch_status: &HashMap<StepId, AcceptanceStatus>,
) -> Option<&'a PlanStep> {
    graph.steps().iter().find(|step| {
        step.status.is_stopped()
            && dispatch_status
                .get(&step.id)
                .is_some_and(AcceptanceStatus::is_accepted)
    })
}

/// Earliest non-null start date and latest non-null end date across the steps
pub fn duration_bounds(steps: &[PlanStep]) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let start = steps.iter().filter_map(|step| step.start_date).min();
    let end = steps.iter().filter_map(|step| step.end_date).max();
    (start, end)
}

/// Total production duration in days, rounded up; None when either bound
/// is missing
pub fn total_duration_days(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Option<i64> {
    let (start, end) = (start?, end?);
    let seconds = end.signed_duration_since(start).num_seconds();
    // ceiling division in whole days
    Some((seconds + 86_400 - 1).div_euclid(86_400))
}

/// Per-step-type collections of archived details; absent details filtered out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchivedDetails {
    pub paper_store: Vec<StepDetail>,
    pub printing_details: Vec<StepDetail>,
    pub corrugation: Vec<StepDetail>,
    pub flute_laminate_board_conversion: Vec<StepDetail>,
    pub punching: Vec<StepDetail>,
    pub side_flap_pasting: Vec<StepDetail>,
    pub quality_dept: Vec<StepDetail>,
    pub dispatch_process: Vec<StepDetail>,
}

impl ArchivedDetails {
    /// Group the details found across a plan's steps by step type
    pub fn collect(details: impl IntoIterator<Item = StepDetail>) -> Self {
        let mut archived = Self::default();
        for detail in details {
            match detail.kind() {
                StepKind::PaperStore => archived.paper_store.push(detail),
                StepKind::PrintingDetails => archived.printing_details.push(detail),
                StepKind::Corrugation => archived.corrugation.push(detail),
                StepKind::FluteLaminateBoardConversion => {
                    archived.flute_laminate_board_conversion.push(detail)
                }
                StepKind::Punching => archived.punching.push(detail),
                StepKind::SideFlapPasting => archived.side_flap_pasting.push(detail),
                StepKind::QualityDept => archived.quality_dept.push(detail),
                StepKind::DispatchProcess => archived.dispatch_process.push(detail),
            }
        }
        archived
    }

    pub fn total(&self) -> usize {
        self.paper_store.len()
            + self.printing_details.len()
            + self.corrugation.len()
            + self.flute_laminate_board_conversion.len()
            + self.punching.len()
            + self.side_flap_pasting.len()
            + self.quality_dept.len()
            + self.dispatch_process.len()
    }
}

/// Immutable archival snapshot of a completed job
///
/// Created exactly once by the completion evaluator; never mutated. Its
/// persistence is atomic with the deletion of the live plan and the job
/// master update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedJob {
    pub id: SnapshotId,
    pub job_no: JobNo,
    pub plan_id: PlanId,
    pub demand: JobDemand,
    pub job: Job,
    pub purchase_order: Option<PurchaseOrder>,
    pub steps: Vec<PlanStep>,
    pub details: ArchivedDetails,
    pub total_duration_days: Option<i64>,
    pub remarks: Option<String>,
    pub completed_by: UserId,
    pub completed_at: DateTime<Utc>,
}

impl CompletedJob {
    /// Assemble the snapshot from the live records
    ///
    /// Steps are archived in `step_no` ascending order; the duration is
    /// computed from the earliest step start to the latest step end.
    pub fn assemble(
        job: Job,
        plan: &JobPlan,
        purchase_order: Option<PurchaseOrder>,
        details: Vec<StepDetail>,
        remarks: Option<String>,
        completed_by: UserId,
    ) -> Self {
        let graph = PlanGraph::from_plan(plan);
        let steps = graph.steps().to_vec();
        let (start, end) = duration_bounds(&steps);

        Self {
            id: SnapshotId::new(),
            job_no: plan.job_no.clone(),
            plan_id: plan.plan_id,
            demand: plan.demand,
            job,
            purchase_order,
            steps,
            details: ArchivedDetails::collect(details),
            total_duration_days: total_duration_days(start, end),
            remarks,
            completed_by,
            completed_at: Utc::now(),
        }
    }
}
