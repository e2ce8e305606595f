//! Job master record and purchase order

use crate::ids::JobNo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Activation status of the job master record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Active,
    Inactive,
    Hold,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "ACTIVE",
            JobStatus::Inactive => "INACTIVE",
            JobStatus::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The job master record, keyed by the business job number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_no: JobNo,
    pub customer_name: String,
    pub style_item_sku: Option<String>,
    pub status: JobStatus,
    pub shade_card_approval_date: Option<DateTime<Utc>>,
    pub artwork_approved_date: Option<DateTime<Utc>>,
    pub artwork_received_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new active job
    pub fn new(job_no: JobNo, customer_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_no,
            customer_name: customer_name.into(),
            style_item_sku: None,
            status: JobStatus::Active,
            shade_card_approval_date: None,
            artwork_approved_date: None,
            artwork_received_date: None,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the completion side effects to the master record: status goes
    /// inactive and the approval/artwork/image fields are cleared
    pub fn mark_completed(&mut self) {
        self.status = JobStatus::Inactive;
        self.shade_card_approval_date = None;
        self.artwork_approved_date = None;
        self.artwork_received_date = None;
        self.image_url = None;
        self.updated_at = Utc::now();
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, JobStatus::Active)
    }
}

/// Purchase order associated with a job; archived with the completion snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: uuid::Uuid,
    pub job_no: JobNo,
    pub po_number: String,
    pub customer: String,
    pub total_quantity: u32,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
