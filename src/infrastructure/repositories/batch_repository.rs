use crate::domain::job::{Job, JobView};
use crate::domain::tts::dto::{BatchStatus, BatchView};
use crate::domain::tts::{BatchObserver, BatchOutcome, CancelToken};
use moka::future::Cache;
use moka::notification::RemovalCause;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const MAX_BATCHES: u64 = 1_000;

/// Live state of one batch. While the batch runs it holds job snapshots;
/// once finished it also owns the jobs, and with them their artifacts.
#[derive(Debug)]
pub struct BatchRecord {
    id: Uuid,
    status: BatchStatus,
    progress: u8,
    jobs: Vec<JobView>,
    success_count: usize,
    error: Option<String>,
    cancel: CancelToken,
    owned_jobs: Vec<Job>,
}

pub type SharedBatch = Arc<RwLock<BatchRecord>>;

impl BatchRecord {
    pub fn new(jobs: &[Job], cancel: CancelToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: BatchStatus::Running,
            progress: 0,
            jobs: jobs.iter().map(Job::view).collect(),
            success_count: 0,
            error: None,
            cancel,
            owned_jobs: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn view(&self) -> BatchView {
        BatchView {
            id: self.id,
            status: self.status,
            progress: self.progress,
            cancelled: self.cancel.is_cancelled(),
            success_count: self.success_count,
            jobs: self.jobs.clone(),
            error: self.error.clone(),
        }
    }

    /// Take ownership of the finished jobs
    pub fn complete(&mut self, outcome: BatchOutcome) {
        match outcome {
            BatchOutcome::Completed {
                jobs,
                success_count,
            } => {
                self.status = BatchStatus::Completed;
                self.success_count = success_count;
                self.progress = 100;
                self.jobs = jobs.iter().map(Job::view).collect();
                self.owned_jobs = jobs;
            }
            BatchOutcome::Rejected { jobs, reason } => {
                self.status = BatchStatus::Rejected;
                self.error = Some(reason.to_string());
                self.jobs = jobs.iter().map(Job::view).collect();
                self.owned_jobs = jobs;
            }
        }
    }
}

/// Mirrors batch progress into a shared record
pub struct RecordObserver {
    record: SharedBatch,
}

impl RecordObserver {
    pub fn new(record: SharedBatch) -> Self {
        Self { record }
    }
}

impl BatchObserver for RecordObserver {
    fn jobs_updated(&mut self, jobs: &[Job]) {
        let views = jobs.iter().map(Job::view).collect();
        self.record.write().jobs = views;
    }

    fn progress(&mut self, percent: u8) {
        self.record.write().progress = percent;
    }
}

/// In-memory batch registry with idle expiry.
///
/// Evicting a finished batch drops its jobs, which releases their audio.
#[derive(Clone)]
pub struct BatchRepository {
    cache: Cache<Uuid, SharedBatch>,
}

impl BatchRepository {
    pub fn new(time_to_idle: Duration) -> Self {
        let cache = Cache::<Uuid, SharedBatch>::builder()
            .max_capacity(MAX_BATCHES)
            .time_to_idle(time_to_idle) // refreshes on access
            .eviction_listener(|id: Arc<Uuid>, _batch: SharedBatch, cause: RemovalCause| {
                tracing::debug!(batch_id = %id, cause = ?cause, "Batch evicted");
            })
            .build();

        Self { cache }
    }

    pub async fn insert(&self, record: BatchRecord) -> SharedBatch {
        let id = record.id();
        let shared = Arc::new(RwLock::new(record));
        self.cache.insert(id, shared.clone()).await;
        shared
    }

    pub async fn find(&self, id: Uuid) -> Option<SharedBatch> {
        self.cache.get(&id).await
    }

    /// Cancel and forget a batch. A batch still running keeps going until
    /// its next cancellation check, then drops its jobs.
    pub async fn evict(&self, id: Uuid) -> bool {
        let Some(batch) = self.cache.remove(&id).await else {
            return false;
        };
        batch.read().cancel_token().cancel();
        drop(batch);
        self.cache.run_pending_tasks().await;
        true
    }

    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}
