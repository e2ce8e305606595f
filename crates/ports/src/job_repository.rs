//! Job Repository Port
//!
//! Defines the interface for job-master and purchase-order persistence.

use async_trait::async_trait;
use corruflow_core::{Job, JobNo, PurchaseOrder};

/// Job repository port
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Save a job master record
    async fn save_job(&self, job: &Job) -> Result<(), JobRepositoryError>;

    /// Get a job by its business number
    async fn find_job(&self, job_no: &JobNo) -> Result<Option<Job>, JobRepositoryError>;

    /// Save a purchase order
    async fn save_purchase_order(&self, po: &PurchaseOrder) -> Result<(), JobRepositoryError>;

    /// First purchase order associated with the job, if any
    async fn purchase_order_for_job(
        &self,
        job_no: &JobNo,
    ) -> Result<Option<PurchaseOrder>, JobRepositoryError>;
}

/// Job repository error
#[derive(thiserror::Error, Debug)]
pub enum JobRepositoryError {
    #[error("job not found: {0}")]
    NotFound(JobNo),

    #[error("database error: {0}")]
    Database(String),
}
