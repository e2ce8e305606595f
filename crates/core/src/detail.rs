//! Step detail records - the process-specific outcome attached to a step
//!
//! Each plan step owns at most one detail record (1:1). The detail's payload
//! is a tagged union over the eight step types, so a detail of the wrong
//! type for a step is unrepresentable.

use crate::ids::{DetailId, JobNo, StepId};
use crate::step::StepKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Acceptance status of a step detail
///
/// Only `Accept` unlocks downstream steps; every other value counts as
/// pending or rejected for workflow gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceStatus {
    Pending,
    InProgress,
    Accept,
    Reject,
}

impl AcceptanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcceptanceStatus::Pending => "pending",
            AcceptanceStatus::InProgress => "in_progress",
            AcceptanceStatus::Accept => "accept",
            AcceptanceStatus::Reject => "reject",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, AcceptanceStatus::Accept)
    }
}

impl std::fmt::Display for AcceptanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Paper pulled from the store for the job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PaperStoreData {
    pub sheet_size: Option<String>,
    pub gsm: Option<String>,
    pub mill: Option<String>,
    pub required_qty: u32,
    pub issued_qty: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PrintingData {
    pub colours: u8,
    pub process_type: Option<String>,
    pub quantity: u32,
    pub wastage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CorrugationData {
    pub flute_type: Option<String>,
    pub gsm1: Option<String>,
    pub gsm2: Option<String>,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FluteLaminationData {
    pub film_type: Option<String>,
    pub adhesive: Option<String>,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PunchingData {
    pub die_used: Option<String>,
    pub quantity: u32,
    pub wastage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SideFlapPastingData {
    pub adhesive: Option<String>,
    pub quantity: u32,
    pub wastage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QualityData {
    pub checked_by: Option<String>,
    pub passed_qty: u32,
    pub rejected_qty: u32,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DispatchData {
    pub dispatch_no: Option<String>,
    pub dispatch_date: Option<DateTime<Utc>>,
    pub no_of_boxes: u32,
    pub vehicle_no: Option<String>,
}

/// Process-specific payload, tagged by step type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", content = "data")]
pub enum ProcessData {
    PaperStore(PaperStoreData),
    PrintingDetails(PrintingData),
    Corrugation(CorrugationData),
    FluteLaminateBoardConversion(FluteLaminationData),
    Punching(PunchingData),
    SideFlapPasting(SideFlapPastingData),
    QualityDept(QualityData),
    DispatchProcess(DispatchData),
}

impl ProcessData {
    /// The step type this payload belongs to
    pub fn kind(&self) -> StepKind {
        match self {
            ProcessData::PaperStore(_) => StepKind::PaperStore,
            ProcessData::PrintingDetails(_) => StepKind::PrintingDetails,
            ProcessData::Corrugation(_) => StepKind::Corrugation,
            ProcessData::FluteLaminateBoardConversion(_) => {
                StepKind::FluteLaminateBoardConversion
            }
            ProcessData::Punching(_) => StepKind::Punching,
            ProcessData::SideFlapPasting(_) => StepKind::SideFlapPasting,
            ProcessData::QualityDept(_) => StepKind::QualityDept,
            ProcessData::DispatchProcess(_) => StepKind::DispatchProcess,
        }
    }

    /// An empty payload of the given kind
    pub fn empty(kind: StepKind) -> Self {
        match kind {
            StepKind::PaperStore => ProcessData::PaperStore(PaperStoreData::default()),
            StepKind::PrintingDetails => ProcessData::PrintingDetails(PrintingData::default()),
            StepKind::Corrugation => ProcessData::Corrugation(CorrugationData::default()),
            StepKind::FluteLaminateBoardConversion => {
                ProcessData::FluteLaminateBoardConversion(FluteLaminationData::default())
            }
            StepKind::Punching => ProcessData::Punching(PunchingData::default()),
            StepKind::SideFlapPasting => {
                ProcessData::SideFlapPasting(SideFlapPastingData::default())
            }
            StepKind::QualityDept => ProcessData::QualityDept(QualityData::default()),
            StepKind::DispatchProcess => ProcessData::DispatchProcess(DispatchData::default()),
        }
    }
}

/// The detail record attached to a plan step after workflow approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDetail {
    pub id: DetailId,
    pub step_id: StepId,
    pub job_no: JobNo,
    pub status: AcceptanceStatus,
    pub process: ProcessData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StepDetail {
    /// Create a new detail in Pending state
    pub fn new(step_id: StepId, job_no: JobNo, process: ProcessData) -> Self {
        let now = Utc::now();
        Self {
            id: DetailId::new(),
            step_id,
            job_no,
            status: AcceptanceStatus::Pending,
            process,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: AcceptanceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn kind(&self) -> StepKind {
        self.process.kind()
    }

    pub fn is_accepted(&self) -> bool {
        self.status.is_accepted()
    }

    pub fn set_status(&mut self, status: AcceptanceStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
