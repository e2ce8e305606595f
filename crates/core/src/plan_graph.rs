//! Ordered in-memory view of a plan's steps
//!
//! Built per validation call from repository reads. The ordering key is
//! `step_no` ascending; step numbers are not guaranteed contiguous.

use crate::ids::StepId;
use crate::plan::JobPlan;
use crate::step::PlanStep;

/// A job plan's steps in `step_no` ascending order, with position lookups
#[derive(Debug, Clone)]
pub struct PlanGraph {
    steps: Vec<PlanStep>,
}

impl PlanGraph {
    pub fn new(mut steps: Vec<PlanStep>) -> Self {
        steps.sort_by_key(|step| step.step_no);
        Self { steps }
    }

    pub fn from_plan(plan: &JobPlan) -> Self {
        Self::new(plan.steps.clone())
    }

    /// Steps in `step_no` ascending order
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Zero-based position of a step within the ordering
    pub fn position(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|step| step.id == id)
    }

    pub fn step(&self, id: StepId) -> Option<&PlanStep> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// The step immediately preceding the given one in `step_no` order
    pub fn predecessor(&self, id: StepId) -> Option<&PlanStep> {
        match self.position(id)? {
            0 => None,
            pos => self.steps.get(pos - 1),
        }
    }

    pub fn first(&self) -> Option<&PlanStep> {
        self.steps.first()
    }
}
