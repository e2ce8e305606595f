//! Domain Core - Business Logic and Shared Types
//!
//! This crate contains the domain entities and value objects of the
//! manufacturing-order tracking system, together with the pure decision
//! logic of the workflow gate and the job completion evaluator. It performs
//! no I/O; persistence lives behind the ports in `corruflow-ports`.

pub mod audit;
pub mod completion;
pub mod detail;
pub mod error;
pub mod ids;
pub mod job;
pub mod plan;
pub mod plan_graph;
pub mod step;
pub mod workflow;

pub use crate::error::DomainError;
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use uuid::Uuid;

// Re-export all types for easy importing
pub use crate::audit::{AuditAction, AuditEntry};
pub use crate::completion::{ArchivedDetails, CompletedJob, CompletionReadiness};
pub use crate::detail::{AcceptanceStatus, ProcessData, StepDetail};
pub use crate::ids::{DetailId, JobNo, PlanId, SnapshotId, StepId, UserId};
pub use crate::job::{Job, JobStatus, PurchaseOrder};
pub use crate::plan::{JobDemand, JobPlan};
pub use crate::plan_graph::PlanGraph;
pub use crate::step::{MachineRef, PlanStep, StepKind, StepStatus};
pub use crate::workflow::{GateRule, StepRequirement, WorkflowDecision};

// Domain result type
pub type Result<T> = std::result::Result<T, DomainError>;
