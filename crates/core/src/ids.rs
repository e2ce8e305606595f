//! Identifier value objects

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Business key of a manufacturing job (the customer-facing job number)
///
/// Non-empty by construction; surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobNo(String);

impl JobNo {
    pub fn new(job_no: impl Into<String>) -> crate::Result<Self> {
        let job_no = job_no.into().trim().to_string();
        if job_no.is_empty() {
            return Err(DomainError::Validation(
                "job number must not be empty".to_string(),
            ));
        }
        Ok(Self(job_no))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the acting user, as issued by the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a job plan
    PlanId
);
uuid_id!(
    /// Identifier of a production step within a plan
    StepId
);
uuid_id!(
    /// Identifier of a step detail record
    DetailId
);
uuid_id!(
    /// Identifier of an archived completed-job snapshot
    SnapshotId
);
