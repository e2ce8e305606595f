//! Job plan aggregate

use crate::ids::{JobNo, PlanId, StepId};
use crate::step::PlanStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Demand priority recorded with the planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobDemand {
    High,
    Medium,
    Low,
}

impl JobDemand {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobDemand::High => "high",
            JobDemand::Medium => "medium",
            JobDemand::Low => "low",
        }
    }
}

impl std::fmt::Display for JobDemand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The live planning record for a job: one per job number, owning the
/// ordered collection of production steps
///
/// Created when planning is first submitted; deleted when the job is
/// completed and archived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPlan {
    pub plan_id: PlanId,
    pub job_no: JobNo,
    pub demand: JobDemand,
    pub steps: Vec<PlanStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobPlan {
    pub fn new(job_no: JobNo, demand: JobDemand, steps: Vec<PlanStep>) -> Self {
        let now = Utc::now();
        Self {
            plan_id: PlanId::new(),
            job_no,
            demand,
            steps,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn step_by_id(&self, id: StepId) -> Option<&PlanStep> {
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn step_by_no(&self, step_no: u32) -> Option<&PlanStep> {
        self.steps.iter().find(|step| step.step_no == step_no)
    }

    pub fn contains_step(&self, id: StepId) -> bool {
        self.step_by_id(id).is_some()
    }

    /// Replace a step in place, bumping `updated_at`
    ///
    /// Returns false when the step does not belong to this plan.
    pub fn replace_step(&mut self, step: PlanStep) -> bool {
        match self.steps.iter_mut().find(|s| s.id == step.id) {
            Some(slot) => {
                *slot = step;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}
