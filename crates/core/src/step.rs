//! Production step entity and its lifecycle

use crate::error::DomainError;
use crate::ids::{StepId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The eight fixed production step types, in their canonical plant order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    PaperStore,
    PrintingDetails,
    Corrugation,
    FluteLaminateBoardConversion,
    Punching,
    SideFlapPasting,
    QualityDept,
    DispatchProcess,
}

impl StepKind {
    pub const ALL: [StepKind; 8] = [
        StepKind::PaperStore,
        StepKind::PrintingDetails,
        StepKind::Corrugation,
        StepKind::FluteLaminateBoardConversion,
        StepKind::Punching,
        StepKind::SideFlapPasting,
        StepKind::QualityDept,
        StepKind::DispatchProcess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::PaperStore => "PaperStore",
            StepKind::PrintingDetails => "PrintingDetails",
            StepKind::Corrugation => "Corrugation",
            StepKind::FluteLaminateBoardConversion => "FluteLaminateBoardConversion",
            StepKind::Punching => "Punching",
            StepKind::SideFlapPasting => "SideFlapPasting",
            StepKind::QualityDept => "QualityDept",
            StepKind::DispatchProcess => "DispatchProcess",
        }
    }

    /// Steps that may only be created once Corrugation and PrintingDetails
    /// have both been accepted for the job
    pub fn requires_corrugation_and_printing(&self) -> bool {
        matches!(
            self,
            StepKind::Punching
                | StepKind::SideFlapPasting
                | StepKind::QualityDept
                | StepKind::DispatchProcess
        )
    }

    /// Steps that run in parallel with each other and only need a PaperStore
    /// detail to exist for the job (its acceptance status is irrelevant)
    pub fn is_parallel_entry(&self) -> bool {
        matches!(self, StepKind::PrintingDetails | StepKind::Corrugation)
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StepKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown step type: {}", s)))
    }
}

/// Lifecycle status of a plan step
///
/// Progression is monotonic: planned -> start -> stop. There is no defined
/// transition backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Planned,
    Start,
    Stop,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Planned => "planned",
            StepStatus::Start => "start",
            StepStatus::Stop => "stop",
        }
    }

    pub fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (StepStatus::Planned, StepStatus::Start) | (StepStatus::Start, StepStatus::Stop)
        )
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, StepStatus::Stop)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Machine assignment carried by a plan step, as submitted with the planning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineRef {
    pub id: String,
    pub unit: String,
    pub machine_code: String,
    pub machine_type: String,
}

/// A single production step within a job plan
///
/// `step_no` defines the sequence order. It is not guaranteed contiguous but
/// forms a total order within a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: StepId,
    pub step_no: u32,
    pub kind: StepKind,
    pub status: StepStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub machines: Vec<MachineRef>,
    pub assigned_to: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanStep {
    /// Create a new step in Planned state with no dates
    pub fn new(step_no: u32, kind: StepKind) -> Self {
        let now = Utc::now();
        Self {
            id: StepId::new(),
            step_no,
            kind,
            status: StepStatus::Planned,
            start_date: None,
            end_date: None,
            machines: Vec::new(),
            assigned_to: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_machines(mut self, machines: Vec<MachineRef>) -> Self {
        self.machines = machines;
        self
    }

    /// Transition the step to Start, stamping `start_date`
    ///
    /// # Errors
    /// Returns `DomainError::InvalidStateTransition` if the step is not Planned
    pub fn start(&mut self, user: Option<UserId>) -> crate::Result<()> {
        self.transition(StepStatus::Start, user)?;
        self.start_date = Some(self.updated_at);
        Ok(())
    }

    /// Transition the step to Stop, stamping `end_date`
    ///
    /// # Errors
    /// Returns `DomainError::InvalidStateTransition` if the step is not Start
    pub fn stop(&mut self, user: Option<UserId>) -> crate::Result<()> {
        self.transition(StepStatus::Stop, user)?;
        self.end_date = Some(self.updated_at);
        Ok(())
    }

    fn transition(&mut self, target: StepStatus, user: Option<UserId>) -> crate::Result<()> {
        if !self.status.can_transition_to(&target) {
            return Err(DomainError::invalid_state_transition(
                self.status.as_str(),
                target.as_str(),
            ));
        }
        self.status = target;
        self.updated_at = Utc::now();
        if user.is_some() {
            self.assigned_to = user;
        }
        Ok(())
    }
}
