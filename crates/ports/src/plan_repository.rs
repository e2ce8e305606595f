//! Job Plan Repository Port
//!
//! Read/write access to the live planning records. A plan always loads with
//! its full step list, so a single read serves the workflow validator's
//! sibling lookup.

use async_trait::async_trait;
use corruflow_core::{JobNo, JobPlan, PlanStep, PlanId, StepId};

/// Plan repository port
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Persist a new plan with its steps
    async fn save_plan(&self, plan: &JobPlan) -> Result<(), PlanRepositoryError>;

    /// The plan owning the given step, with all sibling steps loaded
    async fn plan_for_step(&self, step_id: StepId)
        -> Result<Option<JobPlan>, PlanRepositoryError>;

    /// The plan for a job number, with all steps loaded
    async fn plan_for_job(&self, job_no: &JobNo) -> Result<Option<JobPlan>, PlanRepositoryError>;

    /// Replace a single step of an existing plan
    async fn update_step(
        &self,
        plan_id: PlanId,
        step: &PlanStep,
    ) -> Result<(), PlanRepositoryError>;
}

/// Plan repository error
#[derive(thiserror::Error, Debug)]
pub enum PlanRepositoryError {
    #[error("plan not found: {0}")]
    NotFound(String),

    #[error("a plan already exists for job {0}")]
    AlreadyExists(JobNo),

    #[error("database error: {0}")]
    Database(String),
}
