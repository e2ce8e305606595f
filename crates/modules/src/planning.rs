//! Planning Module
//!
//! Creates the job plan with its ordered steps and drives each step's
//! monotonic lifecycle (planned -> start -> stop), stamping the start and
//! end dates the completion evaluator later aggregates.

use corruflow_core::{
    AuditAction, AuditEntry, DomainError, JobDemand, JobNo, JobPlan, MachineRef, PlanStep,
    StepKind, StepStatus, UserId,
};
use corruflow_ports::{AuditSink, PlanRepository, PlanRepositoryError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// One step of an incoming planning request
#[derive(Debug, Clone, PartialEq)]
pub struct StepDraft {
    pub step_no: u32,
    pub kind: StepKind,
    pub machines: Vec<MachineRef>,
}

pub struct PlanningModule<P, A>
where
    P: PlanRepository,
    A: AuditSink,
{
    plan_repo: Arc<P>,
    audit: Arc<A>,
}

impl<P, A> PlanningModule<P, A>
where
    P: PlanRepository,
    A: AuditSink,
{
    pub fn new(plan_repo: Arc<P>, audit: Arc<A>) -> Self {
        Self { plan_repo, audit }
    }

    /// Submit the planning for a job: every step starts in Planned state
    pub async fn create_planning(
        &self,
        job_no: JobNo,
        demand: JobDemand,
        drafts: Vec<StepDraft>,
        acting_user: Option<UserId>,
    ) -> Result<JobPlan, PlanningError> {
        if drafts.is_empty() {
            return Err(PlanningError::Validation(
                "at least one step is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for draft in &drafts {
            if !seen.insert(draft.step_no) {
                return Err(PlanningError::Validation(format!(
                    "duplicate step number: {}",
                    draft.step_no
                )));
            }
        }

        let steps = drafts
            .into_iter()
            .map(|draft| PlanStep::new(draft.step_no, draft.kind).with_machines(draft.machines))
            .collect();
        let plan = JobPlan::new(job_no, demand, steps);

        self.plan_repo.save_plan(&plan).await?;
        info!(job_no = %plan.job_no, steps = plan.steps.len(), "job planning created");

        if let Some(user) = acting_user {
            let entry = AuditEntry::new(
                user,
                AuditAction::PlanCreated,
                format!(
                    "Created job planning for job: {} with demand: {}",
                    plan.job_no, plan.demand
                ),
            )
            .with_resource("JobPlanning", plan.plan_id.to_string())
            .with_job_no(plan.job_no.clone());
            if let Err(err) = self.audit.record(&entry).await {
                warn!(error = %err, "failed to record planning creation in activity log");
            }
        }

        Ok(plan)
    }

    /// Move a step to Start or Stop, stamping the corresponding date
    pub async fn update_step_status(
        &self,
        job_no: &JobNo,
        step_no: u32,
        target: StepStatus,
        acting_user: Option<UserId>,
    ) -> Result<PlanStep, PlanningError> {
        let plan = self
            .plan_repo
            .plan_for_job(job_no)
            .await?
            .ok_or_else(|| PlanningError::PlanNotFound(job_no.clone()))?;
        let mut step = plan
            .step_by_no(step_no)
            .cloned()
            .ok_or_else(|| PlanningError::StepNotFound {
                job_no: job_no.clone(),
                step_no,
            })?;

        match target {
            StepStatus::Start => step.start(acting_user.clone())?,
            StepStatus::Stop => step.stop(acting_user.clone())?,
            StepStatus::Planned => {
                return Err(DomainError::invalid_state_transition(
                    step.status.as_str(),
                    StepStatus::Planned.as_str(),
                )
                .into());
            }
        }

        self.plan_repo.update_step(plan.plan_id, &step).await?;
        info!(job_no = %job_no, step_no, status = %step.status, "job step status updated");

        if let Some(user) = acting_user {
            let entry = AuditEntry::new(
                user,
                AuditAction::StepUpdated,
                format!(
                    "Updated {} step of job {} to {}",
                    step.kind, job_no, step.status
                ),
            )
            .with_resource("JobStep", step.id.to_string())
            .with_job_no(job_no.clone());
            if let Err(err) = self.audit.record(&entry).await {
                warn!(error = %err, "failed to record step update in activity log");
            }
        }

        Ok(step)
    }

    /// The live planning for a job, with all steps
    pub async fn planning_for_job(&self, job_no: &JobNo) -> Result<JobPlan, PlanningError> {
        self.plan_repo
            .plan_for_job(job_no)
            .await?
            .ok_or_else(|| PlanningError::PlanNotFound(job_no.clone()))
    }
}

impl<P, A> Clone for PlanningModule<P, A>
where
    P: PlanRepository,
    A: AuditSink,
{
    fn clone(&self) -> Self {
        Self {
            plan_repo: self.plan_repo.clone(),
            audit: self.audit.clone(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PlanningError {
    #[error("job planning not found: {0}")]
    PlanNotFound(JobNo),

    #[error("step {step_no} not found in planning of job {job_no}")]
    StepNotFound { job_no: JobNo, step_no: u32 },

    #[error("a plan already exists for job {0}")]
    PlanExists(JobNo),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid step transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("repository error: {0}")]
    Repository(String),
}

impl From<PlanRepositoryError> for PlanningError {
    fn from(err: PlanRepositoryError) -> Self {
        match err {
            PlanRepositoryError::AlreadyExists(job_no) => PlanningError::PlanExists(job_no),
            other => PlanningError::Repository(other.to_string()),
        }
    }
}

impl From<DomainError> for PlanningError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidStateTransition { from, to } => {
                PlanningError::InvalidTransition { from, to }
            }
            other => PlanningError::Repository(other.to_string()),
        }
    }
}

impl From<PlanningError> for DomainError {
    fn from(err: PlanningError) -> Self {
        match err {
            PlanningError::PlanNotFound(_) | PlanningError::StepNotFound { .. } => {
                DomainError::NotFound(err.to_string())
            }
            PlanningError::PlanExists(_) => DomainError::Conflict(err.to_string()),
            PlanningError::Validation(_) => DomainError::Validation(err.to_string()),
            PlanningError::InvalidTransition { from, to } => {
                DomainError::InvalidStateTransition { from, to }
            }
            PlanningError::Repository(_) => DomainError::Infrastructure(err.to_string()),
        }
    }
}
