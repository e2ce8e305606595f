//! In-Memory Plant Store
//!
//! One store behind a single `RwLock` implements every persistence port.
//! Holding the write lock across the whole of `commit_completion` gives the
//! same all-or-nothing guarantee a database transaction provides: the losing
//! side of a concurrent completion observes the plan as already gone.

use async_trait::async_trait;
use corruflow_core::{
    CompletedJob, Job, JobNo, JobPlan, PlanId, PlanStep, PurchaseOrder, SnapshotId, StepDetail,
    StepId, StepKind,
};
use corruflow_ports::{
    ArchiveRepository, ArchiveRepositoryError, DetailRepository, DetailRepositoryError,
    JobRepository, JobRepositoryError, PlanRepository, PlanRepositoryError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Default)]
struct StoreInner {
    jobs: HashMap<JobNo, Job>,
    purchase_orders: Vec<PurchaseOrder>,
    plans: HashMap<PlanId, JobPlan>,
    details: HashMap<StepId, StepDetail>,
    snapshots: HashMap<SnapshotId, CompletedJob>,
}

/// In-memory implementation of all persistence ports
#[derive(Clone)]
pub struct InMemoryPlantStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryPlantStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
        }
    }

    /// Number of live plans (test helper)
    pub async fn plan_count(&self) -> usize {
        self.inner.read().await.plans.len()
    }

    /// Number of archived snapshots (test helper)
    pub async fn snapshot_count(&self) -> usize {
        self.inner.read().await.snapshots.len()
    }
}

impl Default for InMemoryPlantStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlantStore {
    async fn save_plan(&self, plan: &JobPlan) -> Result<(), PlanRepositoryError> {
        let mut inner = self.inner.write().await;
        if inner.plans.values().any(|p| p.job_no == plan.job_no) {
            return Err(PlanRepositoryError::AlreadyExists(plan.job_no.clone()));
        }
        inner.plans.insert(plan.plan_id, plan.clone());
        Ok(())
    }

    async fn plan_for_step(
        &self,
        step_id: StepId,
    ) -> Result<Option<JobPlan>, PlanRepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .plans
            .values()
            .find(|plan| plan.contains_step(step_id))
            .cloned())
    }

    async fn plan_for_job(&self, job_no: &JobNo) -> Result<Option<JobPlan>, PlanRepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.plans.values().find(|p| &p.job_no == job_no).cloned())
    }

    async fn update_step(
        &self,
        plan_id: PlanId,
        step: &PlanStep,
    ) -> Result<(), PlanRepositoryError> {
        let mut inner = self.inner.write().await;
        let plan = inner
            .plans
            .get_mut(&plan_id)
            .ok_or_else(|| PlanRepositoryError::NotFound(plan_id.to_string()))?;
        if !plan.replace_step(step.clone()) {
            return Err(PlanRepositoryError::NotFound(format!(
                "step {} does not belong to plan {}",
                step.id, plan_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DetailRepository for InMemoryPlantStore {
    async fn attach(&self, detail: &StepDetail) -> Result<(), DetailRepositoryError> {
        let mut inner = self.inner.write().await;
        // The 1:1 constraint is the only backstop against concurrent
        // creation requests that both passed validation.
        if inner.details.contains_key(&detail.step_id) {
            return Err(DetailRepositoryError::Conflict(detail.step_id));
        }
        inner.details.insert(detail.step_id, detail.clone());
        Ok(())
    }

    async fn find_by_step(
        &self,
        kind: StepKind,
        step_id: StepId,
    ) -> Result<Option<StepDetail>, DetailRepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .details
            .get(&step_id)
            .filter(|detail| detail.kind() == kind)
            .cloned())
    }

    async fn find_by_job(
        &self,
        kind: StepKind,
        job_no: &JobNo,
    ) -> Result<Option<StepDetail>, DetailRepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .details
            .values()
            .filter(|detail| detail.kind() == kind && &detail.job_no == job_no)
            .min_by_key(|detail| detail.created_at)
            .cloned())
    }

    async fn update(&self, detail: &StepDetail) -> Result<(), DetailRepositoryError> {
        let mut inner = self.inner.write().await;
        match inner.details.get_mut(&detail.step_id) {
            Some(slot) => {
                *slot = detail.clone();
                Ok(())
            }
            None => Err(DetailRepositoryError::NotFound(detail.step_id)),
        }
    }
}

#[async_trait]
impl JobRepository for InMemoryPlantStore {
    async fn save_job(&self, job: &Job) -> Result<(), JobRepositoryError> {
        let mut inner = self.inner.write().await;
        inner.jobs.insert(job.job_no.clone(), job.clone());
        Ok(())
    }

    async fn find_job(&self, job_no: &JobNo) -> Result<Option<Job>, JobRepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.get(job_no).cloned())
    }

    async fn save_purchase_order(&self, po: &PurchaseOrder) -> Result<(), JobRepositoryError> {
        let mut inner = self.inner.write().await;
        inner.purchase_orders.push(po.clone());
        Ok(())
    }

    async fn purchase_order_for_job(
        &self,
        job_no: &JobNo,
    ) -> Result<Option<PurchaseOrder>, JobRepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .purchase_orders
            .iter()
            .find(|po| &po.job_no == job_no)
            .cloned())
    }
}

#[async_trait]
impl ArchiveRepository for InMemoryPlantStore {
    async fn commit_completion(
        &self,
        snapshot: &CompletedJob,
    ) -> Result<SnapshotId, ArchiveRepositoryError> {
        let mut inner = self.inner.write().await;

        let plan = inner
            .plans
            .get(&snapshot.plan_id)
            .filter(|plan| plan.job_no == snapshot.job_no)
            .cloned()
            .ok_or_else(|| ArchiveRepositoryError::PlanNotFound(snapshot.job_no.clone()))?;

        if !inner.jobs.contains_key(&snapshot.job_no) {
            return Err(ArchiveRepositoryError::JobNotFound(snapshot.job_no.clone()));
        }

        inner.snapshots.insert(snapshot.id, snapshot.clone());
        for step in &plan.steps {
            inner.details.remove(&step.id);
        }
        inner.plans.remove(&snapshot.plan_id);
        if let Some(job) = inner.jobs.get_mut(&snapshot.job_no) {
            job.mark_completed();
        }

        info!(job_no = %snapshot.job_no, snapshot = %snapshot.id, "completion committed");
        Ok(snapshot.id)
    }

    async fn find_snapshot(
        &self,
        id: SnapshotId,
    ) -> Result<Option<CompletedJob>, ArchiveRepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.snapshots.get(&id).cloned())
    }

    async fn snapshots_for_job(
        &self,
        job_no: &JobNo,
    ) -> Result<Vec<CompletedJob>, ArchiveRepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .snapshots
            .values()
            .filter(|snapshot| &snapshot.job_no == job_no)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corruflow_core::{
        AcceptanceStatus, JobDemand, JobStatus, ProcessData, UserId,
    };

    fn job_no() -> JobNo {
        JobNo::new("NRC-2024-100").unwrap()
    }

    fn seeded_plan() -> JobPlan {
        JobPlan::new(
            job_no(),
            JobDemand::High,
            vec![
                PlanStep::new(1, StepKind::PaperStore),
                PlanStep::new(2, StepKind::DispatchProcess),
            ],
        )
    }

    #[tokio::test]
    async fn plan_round_trip_by_job_and_by_step() {
        let store = InMemoryPlantStore::new();
        let plan = seeded_plan();
        store.save_plan(&plan).await.unwrap();

        let by_job = store.plan_for_job(&job_no()).await.unwrap().unwrap();
        assert_eq!(by_job.plan_id, plan.plan_id);

        let by_step = store
            .plan_for_step(plan.steps[1].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_step.plan_id, plan.plan_id);

        assert!(store.plan_for_step(StepId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_plan_for_same_job_is_rejected() {
        let store = InMemoryPlantStore::new();
        store.save_plan(&seeded_plan()).await.unwrap();

        let result = store.save_plan(&seeded_plan()).await;
        assert!(matches!(
            result,
            Err(PlanRepositoryError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn attach_enforces_one_detail_per_step() {
        let store = InMemoryPlantStore::new();
        let step_id = StepId::new();
        let detail = StepDetail::new(
            step_id,
            job_no(),
            ProcessData::empty(StepKind::PaperStore),
        );

        store.attach(&detail).await.unwrap();

        // Losing side of the race gets a conflict, not silent duplication.
        let duplicate = StepDetail::new(
            step_id,
            job_no(),
            ProcessData::empty(StepKind::PaperStore),
        );
        let result = store.attach(&duplicate).await;
        assert!(matches!(result, Err(DetailRepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn find_by_step_filters_on_kind() {
        let store = InMemoryPlantStore::new();
        let step_id = StepId::new();
        let detail = StepDetail::new(
            step_id,
            job_no(),
            ProcessData::empty(StepKind::Corrugation),
        );
        store.attach(&detail).await.unwrap();

        assert!(store
            .find_by_step(StepKind::Corrugation, step_id)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_by_step(StepKind::Punching, step_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn find_by_job_returns_earliest_created_match() {
        let store = InMemoryPlantStore::new();
        let first = StepDetail::new(
            StepId::new(),
            job_no(),
            ProcessData::empty(StepKind::Corrugation),
        );
        let mut second = StepDetail::new(
            StepId::new(),
            job_no(),
            ProcessData::empty(StepKind::Corrugation),
        );
        second.created_at = first.created_at + chrono::Duration::seconds(5);

        store.attach(&second).await.unwrap();
        store.attach(&first).await.unwrap();

        let found = store
            .find_by_job(StepKind::Corrugation, &job_no())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn commit_completion_is_all_or_nothing() {
        let store = InMemoryPlantStore::new();
        let plan = seeded_plan();
        store.save_plan(&plan).await.unwrap();
        store
            .save_job(&Job::new(job_no(), "Acme Cartons"))
            .await
            .unwrap();

        let dispatch_detail = StepDetail::new(
            plan.steps[1].id,
            job_no(),
            ProcessData::empty(StepKind::DispatchProcess),
        )
        .with_status(AcceptanceStatus::Accept);
        store.attach(&dispatch_detail).await.unwrap();

        let job = store.find_job(&job_no()).await.unwrap().unwrap();
        let snapshot = CompletedJob::assemble(
            job,
            &plan,
            None,
            vec![dispatch_detail],
            None,
            UserId::new("supervisor-1"),
        );

        let id = store.commit_completion(&snapshot).await.unwrap();
        assert_eq!(id, snapshot.id);

        // Live records are gone, the archive exists, the job is inactive.
        assert!(store.plan_for_job(&job_no()).await.unwrap().is_none());
        assert_eq!(store.plan_count().await, 0);
        assert!(store
            .find_by_step(StepKind::DispatchProcess, plan.steps[1].id)
            .await
            .unwrap()
            .is_none());
        assert!(store.find_snapshot(id).await.unwrap().is_some());
        let job = store.find_job(&job_no()).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Inactive);
    }

    #[tokio::test]
    async fn second_commit_observes_plan_not_found() {
        let store = InMemoryPlantStore::new();
        let plan = seeded_plan();
        store.save_plan(&plan).await.unwrap();
        store
            .save_job(&Job::new(job_no(), "Acme Cartons"))
            .await
            .unwrap();

        let job = store.find_job(&job_no()).await.unwrap().unwrap();
        let snapshot =
            CompletedJob::assemble(job, &plan, None, Vec::new(), None, UserId::new("u1"));

        store.commit_completion(&snapshot).await.unwrap();
        let result = store.commit_completion(&snapshot).await;
        assert!(matches!(
            result,
            Err(ArchiveRepositoryError::PlanNotFound(_))
        ));
        // No duplicate archive was produced.
        assert_eq!(store.snapshot_count().await, 1);
    }

    #[tokio::test]
    async fn purchase_order_lookup_by_job() {
        let store = InMemoryPlantStore::new();
        let po = PurchaseOrder {
            id: uuid::Uuid::new_v4(),
            job_no: job_no(),
            po_number: "PO-77".to_string(),
            customer: "Acme Cartons".to_string(),
            total_quantity: 5000,
            delivery_date: None,
            created_at: chrono::Utc::now(),
        };
        store.save_purchase_order(&po).await.unwrap();

        let found = store
            .purchase_order_for_job(&job_no())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.po_number, "PO-77");

        let other = JobNo::new("NRC-OTHER").unwrap();
        assert!(store
            .purchase_order_for_job(&other)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_step_rejects_foreign_step() {
        let store = InMemoryPlantStore::new();
        let plan = seeded_plan();
        store.save_plan(&plan).await.unwrap();

        let foreign = PlanStep::new(9, StepKind::Punching);
        let result = store.update_step(plan.plan_id, &foreign).await;
        assert!(matches!(result, Err(PlanRepositoryError::NotFound(_))));
    }
}
