//! Completed-Job Archive Port
//!
//! `commit_completion` is the transactional unit of job completion: persist
//! the snapshot, delete every live step and the plan itself, and mark the
//! job master inactive - all or nothing. Implementations must wrap the
//! three mutations in a single serializable-or-stronger transaction so that
//! concurrent completion attempts serialize and at most one succeeds.

use async_trait::async_trait;
use corruflow_core::{CompletedJob, JobNo, SnapshotId};

/// Archive repository port
#[async_trait]
pub trait ArchiveRepository: Send + Sync {
    /// Atomically archive the snapshot, delete the live plan and its steps,
    /// and deactivate the job master record
    ///
    /// Fails with `PlanNotFound` when the plan no longer exists - the losing
    /// side of a concurrent completion observes this instead of a duplicate
    /// archive.
    async fn commit_completion(
        &self,
        snapshot: &CompletedJob,
    ) -> Result<SnapshotId, ArchiveRepositoryError>;

    /// Fetch an archived snapshot by id
    async fn find_snapshot(
        &self,
        id: SnapshotId,
    ) -> Result<Option<CompletedJob>, ArchiveRepositoryError>;

    /// All snapshots archived for a job number
    async fn snapshots_for_job(
        &self,
        job_no: &JobNo,
    ) -> Result<Vec<CompletedJob>, ArchiveRepositoryError>;
}

/// Archive repository error
#[derive(thiserror::Error, Debug)]
pub enum ArchiveRepositoryError {
    #[error("plan not found for job {0}")]
    PlanNotFound(JobNo),

    #[error("job not found: {0}")]
    JobNotFound(JobNo),

    #[error("completion transaction failed: {0}")]
    Transaction(String),

    #[error("database error: {0}")]
    Database(String),
}
