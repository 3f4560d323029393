use super::cancel::CancelToken;
use super::error::TtsServiceError;
use super::progress::{batch_percent, settled_batch_percent, ChunkProgress, MonotonicProgress};
use super::service::ConversionService;
use crate::domain::ingestion::IngestedFile;
use crate::domain::job::{Job, JobSource};
use std::sync::Arc;

const RAW_TEXT_NAME: &str = "speech";
const MERGED_NAME: &str = "merged";
const MERGED_SEPARATOR: &str = "\n\n";

/// Receives live snapshots while a batch runs
pub trait BatchObserver: Send {
    /// Called with the full job list whenever a job starts or finishes
    fn jobs_updated(&mut self, jobs: &[Job]);

    /// Aggregated batch progress; values only ever increase
    fn progress(&mut self, percent: u8);
}

#[derive(Debug)]
pub enum BatchOutcome {
    /// Every job reached a terminal state
    Completed { jobs: Vec<Job>, success_count: usize },
    /// A precondition failed; the jobs are returned exactly as given
    Rejected {
        jobs: Vec<Job>,
        reason: TtsServiceError,
    },
}

impl BatchOutcome {
    pub fn into_jobs(self) -> Vec<Job> {
        match self {
            BatchOutcome::Completed { jobs, .. } | BatchOutcome::Rejected { jobs, .. } => jobs,
        }
    }
}

/// Build the job list for a batch: the typed text, one job per file and,
/// when asked and there is more than one file, a job reading them all
pub fn plan_batch(text: Option<&str>, files: &[IngestedFile], merge_files: bool) -> Vec<Job> {
    let mut jobs = Vec::with_capacity(files.len() + 2);

    if let Some(text) = text {
        jobs.push(Job::new(RAW_TEXT_NAME, JobSource::RawText, text));
    }

    for file in files {
        jobs.push(Job::new(
            file.display_name.as_str(),
            JobSource::SingleFile,
            file.content.as_str(),
        ));
    }

    if merge_files && files.len() > 1 {
        let merged = files
            .iter()
            .map(|f| f.content.as_str())
            .collect::<Vec<_>>()
            .join(MERGED_SEPARATOR);
        jobs.push(Job::new(MERGED_NAME, JobSource::MultiFileMerge, merged));
    }

    jobs
}

/// Runs jobs one after another, isolating their failures
pub struct BatchService {
    conversion: Arc<ConversionService>,
}

impl BatchService {
    pub fn new(conversion: Arc<ConversionService>) -> Self {
        Self { conversion }
    }

    /// Convert every job in order. Only a missing credential stops the batch
    /// before it starts; after that each job ends in `success` or `error`
    /// and the batch always reports 100.
    pub async fn convert_batch(
        &self,
        mut jobs: Vec<Job>,
        credential: Option<&str>,
        voice: Option<&str>,
        cancel: &CancelToken,
        observer: &mut dyn BatchObserver,
    ) -> BatchOutcome {
        let credential = match credential.map(str::trim).filter(|c| !c.is_empty()) {
            Some(credential) => credential,
            None => {
                tracing::warn!(job_count = jobs.len(), "Batch rejected: no credential");
                return BatchOutcome::Rejected {
                    jobs,
                    reason: TtsServiceError::MissingCredential,
                };
            }
        };

        let total_jobs = jobs.len();
        tracing::info!(job_count = total_jobs, "Batch started");

        // A new run starts every job from scratch, releasing old artifacts
        for job in jobs.iter_mut() {
            job.reset();
        }

        let mut progress = MonotonicProgress::default();
        if let Some(percent) = progress.advance(0) {
            observer.progress(percent);
        }

        for position in 0..total_jobs {
            self.run_job(
                &mut jobs,
                position,
                credential,
                voice,
                cancel,
                &mut progress,
                observer,
            )
            .await;

            observer.jobs_updated(&jobs);
            if let Some(percent) = progress.advance(settled_batch_percent(position + 1, total_jobs)) {
                observer.progress(percent);
            }
        }

        if let Some(percent) = progress.advance(100) {
            observer.progress(percent);
        }

        let success_count = jobs
            .iter()
            .filter(|job| job.artifact().is_some())
            .count();
        tracing::info!(
            job_count = total_jobs,
            success_count = success_count,
            cancelled = cancel.is_cancelled(),
            "Batch finished"
        );

        BatchOutcome::Completed {
            jobs,
            success_count,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_job(
        &self,
        jobs: &mut [Job],
        position: usize,
        credential: &str,
        voice: Option<&str>,
        cancel: &CancelToken,
        progress: &mut MonotonicProgress,
        observer: &mut dyn BatchObserver,
    ) {
        let total_jobs = jobs.len();

        let rejection = if cancel.is_cancelled() {
            Some(TtsServiceError::Cancelled)
        } else if !jobs[position].has_content() {
            Some(TtsServiceError::NoContent)
        } else {
            None
        };

        if let Some(reason) = rejection {
            let job = &mut jobs[position];
            tracing::info!(job_id = %job.id(), reason = %reason, "Job skipped");
            if let Err(err) = job.reject(reason) {
                tracing::error!(job_id = %job.id(), error = %err, "Could not reject job");
            }
            return;
        }

        let voice = self.conversion.resolve_voice(jobs[position].text(), voice);
        if let Err(err) = jobs[position].start() {
            tracing::error!(job_id = %jobs[position].id(), error = %err, "Could not start job");
            return;
        }
        observer.jobs_updated(jobs);

        let job = &mut jobs[position];
        let mut on_chunk = |chunk: ChunkProgress| {
            if let Some(percent) = progress.advance(batch_percent(position, chunk, total_jobs)) {
                observer.progress(percent);
            }
        };
        let finished = self
            .conversion
            .execute(job, credential, &voice, cancel, &mut on_chunk)
            .await;
        if let Err(err) = finished {
            tracing::error!(job_id = %job.id(), error = %err, "Could not finish job");
        }
    }
}
