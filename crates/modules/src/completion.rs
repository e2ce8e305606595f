//! Job Completion Module
//!
//! Evaluates the terminal condition of a plan and, when it holds, assembles
//! the archival snapshot and hands it to the archive port's transactional
//! commit. The live plan, its steps and the job master's active status all
//! disappear in that single operation.

use corruflow_core::completion::{self, NOT_READY_REASON};
use corruflow_core::{
    AcceptanceStatus, AuditAction, AuditEntry, CompletedJob, CompletionReadiness, JobNo,
    PlanGraph, StepId, StepKind, UserId,
};
use corruflow_ports::{
    ArchiveRepository, ArchiveRepositoryError, AuditSink, DetailRepository,
    DetailRepositoryError, JobRepository, JobRepositoryError, PlanRepository,
    PlanRepositoryError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct CompletionModule<P, D, J, R, A>
where
    P: PlanRepository,
    D: DetailRepository,
    J: JobRepository,
    R: ArchiveRepository,
    A: AuditSink,
{
    plan_repo: Arc<P>,
    detail_repo: Arc<D>,
    job_repo: Arc<J>,
    archive: Arc<R>,
    audit: Arc<A>,
}

impl<P, D, J, R, A> CompletionModule<P, D, J, R, A>
where
    P: PlanRepository,
    D: DetailRepository,
    J: JobRepository,
    R: ArchiveRepository,
    A: AuditSink,
{
    pub fn new(
        plan_repo: Arc<P>,
        detail_repo: Arc<D>,
        job_repo: Arc<J>,
        archive: Arc<R>,
        audit: Arc<A>,
    ) -> Self {
        Self {
            plan_repo,
            detail_repo,
            job_repo,
            archive,
            audit,
        }
    }

    /// Check whether the job satisfies the terminal condition: some step has
    /// stopped and its dispatch detail is accepted
    pub async fn check_readiness(
        &self,
        job_no: &JobNo,
    ) -> Result<CompletionReadiness, CompletionError> {
        let plan = self
            .plan_repo
            .plan_for_job(job_no)
            .await?
            .ok_or_else(|| CompletionError::PlanNotFound(job_no.clone()))?;
        let graph = PlanGraph::from_plan(&plan);
        let dispatch = self.dispatch_statuses(&graph).await?;

        Ok(match completion::find_completion_step(&graph, &dispatch) {
            Some(step) => CompletionReadiness::ready(step.clone()),
            None => CompletionReadiness::not_ready(),
        })
    }

    /// Complete the job: archive a full snapshot and retire the live records
    ///
    /// Fails with `NotReady` (same reason as `check_readiness`) when the
    /// terminal condition does not hold. A second completion attempt finds
    /// no plan and reports `PlanNotFound`, never a duplicate archive.
    pub async fn complete_job(
        &self,
        job_no: &JobNo,
        remarks: Option<String>,
        acting_user: UserId,
    ) -> Result<CompletedJob, CompletionError> {
        let plan = self
            .plan_repo
            .plan_for_job(job_no)
            .await?
            .ok_or_else(|| CompletionError::PlanNotFound(job_no.clone()))?;
        let graph = PlanGraph::from_plan(&plan);

        let dispatch = self.dispatch_statuses(&graph).await?;
        if completion::find_completion_step(&graph, &dispatch).is_none() {
            return Err(CompletionError::NotReady(NOT_READY_REASON.to_string()));
        }

        let job = self
            .job_repo
            .find_job(job_no)
            .await?
            .ok_or_else(|| CompletionError::JobNotFound(job_no.clone()))?;
        let purchase_order = self.job_repo.purchase_order_for_job(job_no).await?;

        // Historical detail for every populated step type, not just the
        // dispatch-matched step.
        let mut details = Vec::new();
        for step in graph.steps() {
            if let Some(detail) = self.detail_repo.find_by_step(step.kind, step.id).await? {
                details.push(detail);
            }
        }

        let snapshot = CompletedJob::assemble(
            job,
            &plan,
            purchase_order,
            details,
            remarks,
            acting_user.clone(),
        );
        let snapshot_id = self.archive.commit_completion(&snapshot).await?;

        info!(
            job_no = %job_no,
            snapshot = %snapshot_id,
            duration_days = ?snapshot.total_duration_days,
            "job completed and archived"
        );

        let duration = snapshot
            .total_duration_days
            .map(|days| days.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let entry = AuditEntry::new(
            acting_user,
            AuditAction::JobCompleted,
            format!("Completed job: {} with total duration: {} days", job_no, duration),
        )
        .with_resource("CompletedJob", snapshot_id.to_string())
        .with_job_no(job_no.clone());
        if let Err(err) = self.audit.record(&entry).await {
            warn!(error = %err, "failed to record job completion in activity log");
        }

        Ok(snapshot)
    }

    async fn dispatch_statuses(
        &self,
        graph: &PlanGraph,
    ) -> Result<HashMap<StepId, AcceptanceStatus>, CompletionError> {
        let mut statuses = HashMap::new();
        for step in graph.steps() {
            if step.kind != StepKind::DispatchProcess {
                continue;
            }
            if let Some(detail) = self
                .detail_repo
                .find_by_step(StepKind::DispatchProcess, step.id)
                .await?
            {
                statuses.insert(step.id, detail.status);
            }
        }
        Ok(statuses)
    }
}

impl<P, D, J, R, A> Clone for CompletionModule<P, D, J, R, A>
where
    P: PlanRepository,
    D: DetailRepository,
    J: JobRepository,
    R: ArchiveRepository,
    A: AuditSink,
{
    fn clone(&self) -> Self {
        Self {
            plan_repo: self.plan_repo.clone(),
            detail_repo: self.detail_repo.clone(),
            job_repo: self.job_repo.clone(),
            archive: self.archive.clone(),
            audit: self.audit.clone(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CompletionError {
    #[error("job planning not found: {0}")]
    PlanNotFound(JobNo),

    #[error("job not found: {0}")]
    JobNotFound(JobNo),

    #[error("{0}")]
    NotReady(String),

    #[error("completion transaction failed: {0}")]
    Transaction(String),

    #[error("repository error: {0}")]
    Repository(String),
}

impl From<PlanRepositoryError> for CompletionError {
    fn from(err: PlanRepositoryError) -> Self {
        CompletionError::Repository(err.to_string())
    }
}

impl From<DetailRepositoryError> for CompletionError {
    fn from(err: DetailRepositoryError) -> Self {
        CompletionError::Repository(err.to_string())
    }
}

impl From<JobRepositoryError> for CompletionError {
    fn from(err: JobRepositoryError) -> Self {
        match err {
            JobRepositoryError::NotFound(job_no) => CompletionError::JobNotFound(job_no),
            other => CompletionError::Repository(other.to_string()),
        }
    }
}

impl From<ArchiveRepositoryError> for CompletionError {
    fn from(err: ArchiveRepositoryError) -> Self {
        match err {
            ArchiveRepositoryError::PlanNotFound(job_no) => {
                CompletionError::PlanNotFound(job_no)
            }
            ArchiveRepositoryError::JobNotFound(job_no) => CompletionError::JobNotFound(job_no),
            ArchiveRepositoryError::Transaction(reason) => CompletionError::Transaction(reason),
            ArchiveRepositoryError::Database(reason) => CompletionError::Repository(reason),
        }
    }
}

impl From<CompletionError> for corruflow_core::DomainError {
    fn from(err: CompletionError) -> Self {
        use corruflow_core::DomainError;
        match err {
            CompletionError::PlanNotFound(_) | CompletionError::JobNotFound(_) => {
                DomainError::NotFound(err.to_string())
            }
            CompletionError::NotReady(_) => DomainError::Validation(err.to_string()),
            CompletionError::Transaction(_) | CompletionError::Repository(_) => {
                DomainError::Infrastructure(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use corruflow_core::{
        Job, JobDemand, JobPlan, PlanStep, ProcessData, PurchaseOrder, SnapshotId, StepDetail,
    };
    use std::sync::Mutex;

    struct MockPlanRepository {
        plan: Option<JobPlan>,
    }

    #[async_trait]
    impl PlanRepository for MockPlanRepository {
        async fn save_plan(&self, _plan: &JobPlan) -> Result<(), PlanRepositoryError> {
            Ok(())
        }

        async fn plan_for_step(
            &self,
            step_id: StepId,
        ) -> Result<Option<JobPlan>, PlanRepositoryError> {
            Ok(self
                .plan
                .clone()
                .filter(|plan| plan.contains_step(step_id)))
        }

        async fn plan_for_job(
            &self,
            job_no: &JobNo,
        ) -> Result<Option<JobPlan>, PlanRepositoryError> {
            Ok(self.plan.clone().filter(|plan| &plan.job_no == job_no))
        }

        async fn update_step(
            &self,
            _plan_id: corruflow_core::PlanId,
            _step: &PlanStep,
        ) -> Result<(), PlanRepositoryError> {
            Ok(())
        }
    }

    struct MockDetailRepository {
        details: Vec<StepDetail>,
    }

    #[async_trait]
    impl DetailRepository for MockDetailRepository {
        async fn attach(&self, _detail: &StepDetail) -> Result<(), DetailRepositoryError> {
            Ok(())
        }

        async fn find_by_step(
            &self,
            kind: StepKind,
            step_id: StepId,
        ) -> Result<Option<StepDetail>, DetailRepositoryError> {
            Ok(self
                .details
                .iter()
                .find(|d| d.step_id == step_id && d.kind() == kind)
                .cloned())
        }

        async fn find_by_job(
            &self,
            kind: StepKind,
            job_no: &JobNo,
        ) -> Result<Option<StepDetail>, DetailRepositoryError> {
            Ok(self
                .details
                .iter()
                .find(|d| &d.job_no == job_no && d.kind() == kind)
                .cloned())
        }

        async fn update(&self, _detail: &StepDetail) -> Result<(), DetailRepositoryError> {
            Ok(())
        }
    }

    struct MockJobRepository {
        job: Option<Job>,
        purchase_order: Option<PurchaseOrder>,
    }

    #[async_trait]
    impl JobRepository for MockJobRepository {
        async fn save_job(&self, _job: &Job) -> Result<(), JobRepositoryError> {
            Ok(())
        }

        async fn find_job(&self, _job_no: &JobNo) -> Result<Option<Job>, JobRepositoryError> {
            Ok(self.job.clone())
        }

        async fn save_purchase_order(
            &self,
            _po: &PurchaseOrder,
        ) -> Result<(), JobRepositoryError> {
            Ok(())
        }

        async fn purchase_order_for_job(
            &self,
            _job_no: &JobNo,
        ) -> Result<Option<PurchaseOrder>, JobRepositoryError> {
            Ok(self.purchase_order.clone())
        }
    }

    #[derive(Default)]
    struct MockArchive {
        committed: Mutex<Vec<CompletedJob>>,
        fail_with: Mutex<Option<ArchiveRepositoryError>>,
    }

    #[async_trait]
    impl ArchiveRepository for MockArchive {
        async fn commit_completion(
            &self,
            snapshot: &CompletedJob,
        ) -> Result<SnapshotId, ArchiveRepositoryError> {
            if let Some(err) = self.fail_with.lock().unwrap().take() {
                return Err(err);
            }
            self.committed.lock().unwrap().push(snapshot.clone());
            Ok(snapshot.id)
        }

        async fn find_snapshot(
            &self,
            id: SnapshotId,
        ) -> Result<Option<CompletedJob>, ArchiveRepositoryError> {
            Ok(self
                .committed
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == id)
                .cloned())
        }

        async fn snapshots_for_job(
            &self,
            job_no: &JobNo,
        ) -> Result<Vec<CompletedJob>, ArchiveRepositoryError> {
            Ok(self
                .committed
                .lock()
                .unwrap()
                .iter()
                .filter(|s| &s.job_no == job_no)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingAuditSink {
        entries: Mutex<Vec<AuditEntry>>,
    }

    #[async_trait]
    impl AuditSink for RecordingAuditSink {
        async fn record(
            &self,
            entry: &AuditEntry,
        ) -> Result<(), corruflow_ports::AuditSinkError> {
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    fn job_no() -> JobNo {
        JobNo::new("NRC-2024-300").unwrap()
    }

    fn ready_plan() -> (JobPlan, Vec<StepDetail>) {
        let mut dispatch_step = PlanStep::new(20, StepKind::DispatchProcess);
        dispatch_step.start(None).unwrap();
        dispatch_step.stop(None).unwrap();
        let paper_step = PlanStep::new(10, StepKind::PaperStore);

        let dispatch_detail = StepDetail::new(
            dispatch_step.id,
            job_no(),
            ProcessData::empty(StepKind::DispatchProcess),
        )
        .with_status(AcceptanceStatus::Accept);
        let paper_detail = StepDetail::new(
            paper_step.id,
            job_no(),
            ProcessData::empty(StepKind::PaperStore),
        )
        .with_status(AcceptanceStatus::Accept);

        let plan = JobPlan::new(job_no(), JobDemand::High, vec![paper_step, dispatch_step]);
        (plan, vec![paper_detail, dispatch_detail])
    }

    #[allow(clippy::type_complexity)]
    fn module(
        plan: Option<JobPlan>,
        details: Vec<StepDetail>,
        job: Option<Job>,
    ) -> (
        CompletionModule<
            MockPlanRepository,
            MockDetailRepository,
            MockJobRepository,
            MockArchive,
            RecordingAuditSink,
        >,
        Arc<MockArchive>,
        Arc<RecordingAuditSink>,
    ) {
        let archive = Arc::new(MockArchive::default());
        let audit = Arc::new(RecordingAuditSink::default());
        let module = CompletionModule::new(
            Arc::new(MockPlanRepository { plan }),
            Arc::new(MockDetailRepository { details }),
            Arc::new(MockJobRepository {
                job,
                purchase_order: None,
            }),
            archive.clone(),
            audit.clone(),
        );
        (module, archive, audit)
    }

    #[tokio::test]
    async fn readiness_holds_for_stopped_step_with_accepted_dispatch() {
        let (plan, details) = ready_plan();
        let (module, _, _) = module(Some(plan), details, None);

        let readiness = module.check_readiness(&job_no()).await.unwrap();
        assert!(readiness.is_ready);
        assert_eq!(readiness.matched_step.unwrap().step_no, 20);
        assert!(readiness.reason.is_none());
    }

    #[tokio::test]
    async fn readiness_fails_for_rejected_dispatch() {
        let (plan, mut details) = ready_plan();
        details[1].set_status(AcceptanceStatus::Reject);
        let (module, _, _) = module(Some(plan), details, None);

        let readiness = module.check_readiness(&job_no()).await.unwrap();
        assert!(!readiness.is_ready);
        assert!(readiness.matched_step.is_none());
        assert_eq!(readiness.reason.as_deref(), Some(NOT_READY_REASON));
    }

    #[tokio::test]
    async fn readiness_fails_for_missing_dispatch_detail() {
        let (plan, details) = ready_plan();
        let only_paper = vec![details[0].clone()];
        let (module, _, _) = module(Some(plan), only_paper, None);

        let readiness = module.check_readiness(&job_no()).await.unwrap();
        assert!(!readiness.is_ready);
    }

    #[tokio::test]
    async fn readiness_for_unknown_job_is_not_found() {
        let (module, _, _) = module(None, Vec::new(), None);
        let result = module.check_readiness(&job_no()).await;
        assert!(matches!(result, Err(CompletionError::PlanNotFound(_))));
    }

    #[tokio::test]
    async fn complete_job_archives_all_populated_details() {
        let (plan, details) = ready_plan();
        let job = Job::new(job_no(), "Acme Cartons");
        let (module, archive, audit) = module(Some(plan), details, Some(job));

        let snapshot = module
            .complete_job(
                &job_no(),
                Some("shipped complete".to_string()),
                UserId::new("supervisor-2"),
            )
            .await
            .unwrap();

        assert_eq!(snapshot.details.paper_store.len(), 1);
        assert_eq!(snapshot.details.dispatch_process.len(), 1);
        assert_eq!(snapshot.remarks.as_deref(), Some("shipped complete"));
        assert_eq!(archive.committed.lock().unwrap().len(), 1);

        let entries = audit.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::JobCompleted);
        assert!(entries[0].details.contains("NRC-2024-300"));
    }

    #[tokio::test]
    async fn complete_job_fails_fast_when_not_ready() {
        let (plan, _) = ready_plan();
        let job = Job::new(job_no(), "Acme Cartons");
        let (module, archive, _) = module(Some(plan), Vec::new(), Some(job));

        let result = module
            .complete_job(&job_no(), None, UserId::new("u1"))
            .await;
        match result {
            Err(CompletionError::NotReady(reason)) => assert_eq!(reason, NOT_READY_REASON),
            other => panic!("unexpected result: {:?}", other.map(|s| s.id)),
        }
        assert!(archive.committed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn complete_job_without_master_record_is_not_found() {
        let (plan, details) = ready_plan();
        let (module, _, _) = module(Some(plan), details, None);

        let result = module
            .complete_job(&job_no(), None, UserId::new("u1"))
            .await;
        assert!(matches!(result, Err(CompletionError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn losing_completion_race_reports_plan_not_found() {
        let (plan, details) = ready_plan();
        let job = Job::new(job_no(), "Acme Cartons");
        let (module, archive, _) = module(Some(plan), details, Some(job));
        *archive.fail_with.lock().unwrap() =
            Some(ArchiveRepositoryError::PlanNotFound(job_no()));

        let result = module
            .complete_job(&job_no(), None, UserId::new("u1"))
            .await;
        assert!(matches!(result, Err(CompletionError::PlanNotFound(_))));
    }

    #[tokio::test]
    async fn transaction_failure_surfaces_without_partial_state() {
        let (plan, details) = ready_plan();
        let job = Job::new(job_no(), "Acme Cartons");
        let (module, archive, audit) = module(Some(plan), details, Some(job));
        *archive.fail_with.lock().unwrap() = Some(ArchiveRepositoryError::Transaction(
            "serialization failure".to_string(),
        ));

        let result = module
            .complete_job(&job_no(), None, UserId::new("u1"))
            .await;
        assert!(matches!(result, Err(CompletionError::Transaction(_))));
        assert!(archive.committed.lock().unwrap().is_empty());
        // No completion, no audit entry.
        assert!(audit.entries.lock().unwrap().is_empty());
    }
}
