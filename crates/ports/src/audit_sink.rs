//! Activity Log Sink Port
//!
//! Append-only log of user actions. Writes are fire-and-forget from the
//! application layer's point of view: a sink failure is logged locally and
//! never affects the operation being recorded.

use async_trait::async_trait;
use corruflow_core::AuditEntry;

/// Audit sink port
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one activity-log entry
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditSinkError>;
}

/// Audit sink error
#[derive(thiserror::Error, Debug)]
pub enum AuditSinkError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}
