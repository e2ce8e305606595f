//! Step Detail Repository Port
//!
//! A step owns at most one detail record. The storage layer enforces that
//! 1:1 relationship with a uniqueness constraint, which is the only backstop
//! against two concurrent creation requests racing past validation.

use async_trait::async_trait;
use corruflow_core::{JobNo, StepDetail, StepId, StepKind};

/// Step detail repository port
#[async_trait]
pub trait DetailRepository: Send + Sync {
    /// Attach a detail to its step
    ///
    /// Fails with `Conflict` when the step already has a detail; the caller
    /// lost the race and should re-fetch state rather than retry.
    async fn attach(&self, detail: &StepDetail) -> Result<(), DetailRepositoryError>;

    /// The detail of the given type attached to a specific step
    async fn find_by_step(
        &self,
        kind: StepKind,
        step_id: StepId,
    ) -> Result<Option<StepDetail>, DetailRepositoryError>;

    /// First detail of the given type anywhere in the job
    ///
    /// Used by the parallel-entry and gated-pair checks, which are job-scoped
    /// rather than step-scoped.
    async fn find_by_job(
        &self,
        kind: StepKind,
        job_no: &JobNo,
    ) -> Result<Option<StepDetail>, DetailRepositoryError>;

    /// Persist an updated detail (acceptance status changes)
    async fn update(&self, detail: &StepDetail) -> Result<(), DetailRepositoryError>;
}

/// Step detail repository error
#[derive(thiserror::Error, Debug)]
pub enum DetailRepositoryError {
    #[error("detail not found for step {0}")]
    NotFound(StepId),

    #[error("step {0} already has a detail attached")]
    Conflict(StepId),

    #[error("database error: {0}")]
    Database(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detail_repository_trait_is_object_safe() {
        let _repo: Option<Box<dyn DetailRepository>> = None;
    }

    #[test]
    fn conflict_display_names_the_step() {
        let step_id = StepId::new();
        let err = DetailRepositoryError::Conflict(step_id);
        assert!(err.to_string().contains(&step_id.to_string()));
    }
}
