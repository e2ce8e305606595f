//! Ports - Abstraction Layer
//!
//! This crate defines ports (traits) that represent the interfaces
//! needed by the application layer. These are implemented by adapters
//! in the infrastructure layer.

pub mod archive_repository;
pub mod audit_sink;
pub mod detail_repository;
pub mod job_repository;
pub mod plan_repository;

pub use crate::archive_repository::{ArchiveRepository, ArchiveRepositoryError};
pub use crate::audit_sink::{AuditSink, AuditSinkError};
pub use crate::detail_repository::{DetailRepository, DetailRepositoryError};
pub use crate::job_repository::{JobRepository, JobRepositoryError};
pub use crate::plan_repository::{PlanRepository, PlanRepositoryError};
