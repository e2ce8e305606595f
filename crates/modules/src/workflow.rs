//! Workflow Validation Module
//!
//! Loads the plan view through the repositories, runs the pure gating rules
//! from `corruflow-core::workflow`, and - on approval - attaches the step
//! detail and records the activity-log entry.

use corruflow_core::workflow::{self, GateRule};
use corruflow_core::{
    AcceptanceStatus, AuditAction, AuditEntry, JobNo, JobPlan, PlanGraph, ProcessData, StepDetail,
    StepId, StepKind, StepStatus, UserId, WorkflowDecision,
};
use corruflow_ports::{
    AuditSink, DetailRepository, DetailRepositoryError, PlanRepository, PlanRepositoryError,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-step progress line in the workflow status view
#[derive(Debug, Clone, PartialEq)]
pub struct StepProgress {
    pub step_no: u32,
    pub kind: StepKind,
    pub status: StepStatus,
    pub detail_status: Option<AcceptanceStatus>,
}

/// Snapshot of a job's progress through the workflow
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowStatus {
    pub job_no: JobNo,
    pub steps: Vec<StepProgress>,
}

pub struct WorkflowModule<P, D, A>
where
    P: PlanRepository,
    D: DetailRepository,
    A: AuditSink,
{
    plan_repo: Arc<P>,
    detail_repo: Arc<D>,
    audit: Arc<A>,
}

impl<P, D, A> WorkflowModule<P, D, A>
where
    P: PlanRepository,
    D: DetailRepository,
    A: AuditSink,
{
    pub fn new(plan_repo: Arc<P>, detail_repo: Arc<D>, audit: Arc<A>) -> Self {
        Self {
            plan_repo,
            detail_repo,
            audit,
        }
    }

    /// Decide whether a detail of `kind` may be created on the given step
    ///
    /// Never mutates state. A negative decision is a normal return value;
    /// only an unknown step id is an error.
    pub async fn validate_step_creation(
        &self,
        step_id: StepId,
        kind: StepKind,
    ) -> Result<WorkflowDecision, WorkflowError> {
        let (_, decision) = self.decide(step_id, kind).await?;
        Ok(decision)
    }

    /// Validate and, on approval, attach the step detail
    ///
    /// The storage layer's one-detail-per-step constraint converts a
    /// duplicate-creation race into `WorkflowError::Conflict`.
    pub async fn attach_step_detail(
        &self,
        step_id: StepId,
        process: ProcessData,
        acting_user: Option<UserId>,
    ) -> Result<StepDetail, WorkflowError> {
        let kind = process.kind();
        let (plan, decision) = self.decide(step_id, kind).await?;

        if !decision.can_proceed {
            return Err(WorkflowError::Blocked(decision));
        }

        if let Some(step) = plan.step_by_id(step_id) {
            if step.kind != kind {
                return Err(WorkflowError::KindMismatch {
                    step_id,
                    expected: step.kind,
                    got: kind,
                });
            }
        }

        let detail = StepDetail::new(step_id, plan.job_no.clone(), process);
        self.detail_repo.attach(&detail).await?;

        info!(
            job_no = %plan.job_no,
            step = %kind,
            "step detail attached"
        );

        if let Some(user) = acting_user {
            let entry = AuditEntry::new(
                user,
                AuditAction::StepCreated,
                format!("Created {} step for job step: {}", kind, step_id),
            )
            .with_resource(kind.as_str(), detail.id.to_string())
            .with_job_no(plan.job_no.clone());
            if let Err(err) = self.audit.record(&entry).await {
                warn!(error = %err, "failed to record step creation in activity log");
            }
        }

        Ok(detail)
    }

    /// Per-step progress of the plan: lifecycle status plus the attached
    /// detail's acceptance status, in `step_no` order
    pub async fn workflow_status(&self, job_no: &JobNo) -> Result<WorkflowStatus, WorkflowError> {
        let plan = self
            .plan_repo
            .plan_for_job(job_no)
            .await?
            .ok_or_else(|| WorkflowError::PlanNotFound(job_no.clone()))?;
        let graph = PlanGraph::from_plan(&plan);

        let mut steps = Vec::with_capacity(graph.len());
        for step in graph.steps() {
            let detail = self.detail_repo.find_by_step(step.kind, step.id).await?;
            steps.push(StepProgress {
                step_no: step.step_no,
                kind: step.kind,
                status: step.status,
                detail_status: detail.map(|d| d.status),
            });
        }

        Ok(WorkflowStatus {
            job_no: plan.job_no,
            steps,
        })
    }

    async fn decide(
        &self,
        step_id: StepId,
        kind: StepKind,
    ) -> Result<(JobPlan, WorkflowDecision), WorkflowError> {
        let plan = self
            .plan_repo
            .plan_for_step(step_id)
            .await?
            .ok_or(WorkflowError::StepNotFound(step_id))?;
        let graph = PlanGraph::from_plan(&plan);

        let rule = workflow::gate_rule(&graph, step_id, kind)
            .map_err(|_| WorkflowError::StepNotFound(step_id))?;

        let decision = match rule {
            GateRule::FirstStep => WorkflowDecision::approved(),
            GateRule::CorrugationAndPrintingAccepted => {
                let corrugation = self
                    .detail_repo
                    .find_by_job(StepKind::Corrugation, &plan.job_no)
                    .await?;
                let printing = self
                    .detail_repo
                    .find_by_job(StepKind::PrintingDetails, &plan.job_no)
                    .await?;
                workflow::evaluate_gated_pair(corrugation.as_ref(), printing.as_ref())
            }
            GateRule::PaperStoreExists => {
                let paper_store = self
                    .detail_repo
                    .find_by_job(StepKind::PaperStore, &plan.job_no)
                    .await?;
                workflow::evaluate_parallel_entry(paper_store.as_ref())
            }
            GateRule::PreviousStepAccepted(prev) => {
                let prev_detail = self.detail_repo.find_by_step(prev.kind, prev.id).await?;
                workflow::evaluate_previous_step(&prev, prev_detail.as_ref())
            }
        };

        Ok((plan, decision))
    }
}

impl<P, D, A> Clone for WorkflowModule<P, D, A>
where
    P: PlanRepository,
    D: DetailRepository,
    A: AuditSink,
{
    fn clone(&self) -> Self {
        Self {
            plan_repo: self.plan_repo.clone(),
            detail_repo: self.detail_repo.clone(),
            audit: self.audit.clone(),
        }
    }
}

fn blocked_reason(decision: &WorkflowDecision) -> &str {
    decision
        .message
        .as_deref()
        .unwrap_or("workflow prerequisites unmet")
}

#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error("job step not found: {0}")]
    StepNotFound(StepId),

    #[error("job planning not found: {0}")]
    PlanNotFound(JobNo),

    #[error("{}", blocked_reason(.0))]
    Blocked(WorkflowDecision),

    #[error("step {step_id} is a {expected} step, got {got} detail")]
    KindMismatch {
        step_id: StepId,
        expected: StepKind,
        got: StepKind,
    },

    #[error("step {0} already has a detail attached")]
    Conflict(StepId),

    #[error("repository error: {0}")]
    Repository(String),
}

impl From<PlanRepositoryError> for WorkflowError {
    fn from(err: PlanRepositoryError) -> Self {
        WorkflowError::Repository(err.to_string())
    }
}

impl From<DetailRepositoryError> for WorkflowError {
    fn from(err: DetailRepositoryError) -> Self {
        match err {
            DetailRepositoryError::Conflict(step_id) => WorkflowError::Conflict(step_id),
            other => WorkflowError::Repository(other.to_string()),
        }
    }
}

impl From<WorkflowError> for corruflow_core::DomainError {
    fn from(err: WorkflowError) -> Self {
        use corruflow_core::DomainError;
        match err {
            WorkflowError::StepNotFound(_) | WorkflowError::PlanNotFound(_) => {
                DomainError::NotFound(err.to_string())
            }
            WorkflowError::Blocked(_) | WorkflowError::KindMismatch { .. } => {
                DomainError::Validation(err.to_string())
            }
            WorkflowError::Conflict(_) => DomainError::Conflict(err.to_string()),
            WorkflowError::Repository(_) => DomainError::Infrastructure(err.to_string()),
        }
    }
}
