//! Activity-log entries recorded after successful operations

use crate::ids::{JobNo, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The user actions the backend records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    PlanCreated,
    StepCreated,
    StepUpdated,
    JobCompleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::PlanCreated => "JobPlanning Created",
            AuditAction::StepCreated => "JobStep Created",
            AuditAction::StepUpdated => "JobStep Updated",
            AuditAction::JobCompleted => "Job Completed",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only activity-log record
///
/// Recording is fire-and-forget: a failed write must never roll back the
/// operation it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: UserId,
    pub action: AuditAction,
    pub details: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub job_no: Option<JobNo>,
    pub logged_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(user_id: UserId, action: AuditAction, details: impl Into<String>) -> Self {
        Self {
            user_id,
            action,
            details: details.into(),
            resource_type: None,
            resource_id: None,
            job_no: None,
            logged_at: Utc::now(),
        }
    }

    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_job_no(mut self, job_no: JobNo) -> Self {
        self.job_no = Some(job_no);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_builder_attaches_resource_and_job() {
        let entry = AuditEntry::new(
            UserId::new("user-1"),
            AuditAction::JobCompleted,
            "Completed job: NRC-1 with total duration: 9 days",
        )
        .with_resource("CompletedJob", "abc-123")
        .with_job_no(JobNo::new("NRC-1").unwrap());

        assert_eq!(entry.action.as_str(), "Job Completed");
        assert_eq!(entry.resource_type.as_deref(), Some("CompletedJob"));
        assert_eq!(entry.job_no.unwrap().as_str(), "NRC-1");
    }
}
