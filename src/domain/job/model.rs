use super::error::JobError;
use crate::domain::audio::ArtifactHandle;
use crate::domain::tts::TtsServiceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const AUDIO_EXTENSION: &str = ".mp3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSource {
    RawText,
    SingleFile,
    MultiFileMerge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Success,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Success => "success",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Results live inside the state, so a finished job carries exactly one of
/// an artifact or an error.
#[derive(Debug)]
enum JobState {
    Pending,
    Processing,
    Success(ArtifactHandle),
    Error(TtsServiceError),
}

/// One text-to-audio conversion unit
#[derive(Debug)]
pub struct Job {
    id: Uuid,
    display_name: String,
    output_filename: String,
    source: JobSource,
    text: String,
    chunk_count: Option<usize>,
    state: JobState,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(display_name: impl Into<String>, source: JobSource, text: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            id: Uuid::new_v4(),
            output_filename: audio_filename(&display_name),
            display_name,
            source,
            text: text.into(),
            chunk_count: None,
            state: JobState::Pending,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn output_filename(&self) -> &str {
        &self.output_filename
    }

    pub fn source(&self) -> JobSource {
        self.source
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Number of chunks the text was split into, once segmentation ran
    pub fn chunk_count(&self) -> Option<usize> {
        self.chunk_count
    }

    pub fn status(&self) -> JobStatus {
        match self.state {
            JobState::Pending => JobStatus::Pending,
            JobState::Processing => JobStatus::Processing,
            JobState::Success(_) => JobStatus::Success,
            JobState::Error(_) => JobStatus::Error,
        }
    }

    pub fn artifact(&self) -> Option<&ArtifactHandle> {
        match &self.state {
            JobState::Success(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&TtsServiceError> {
        match &self.state {
            JobState::Error(err) => Some(err),
            _ => None,
        }
    }

    /// pending → processing
    pub fn start(&mut self) -> Result<(), JobError> {
        self.expect_status(JobStatus::Pending, JobStatus::Processing)?;
        self.state = JobState::Processing;
        Ok(())
    }

    pub(crate) fn record_chunk_count(&mut self, chunk_count: usize) {
        self.chunk_count = Some(chunk_count);
    }

    /// processing → success | error
    pub fn finish(&mut self, outcome: Result<ArtifactHandle, TtsServiceError>) -> Result<(), JobError> {
        let to = match outcome {
            Ok(_) => JobStatus::Success,
            Err(_) => JobStatus::Error,
        };
        self.expect_status(JobStatus::Processing, to)?;
        self.state = match outcome {
            Ok(handle) => JobState::Success(handle),
            Err(err) => JobState::Error(err),
        };
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// pending → error, for jobs that are never started
    pub fn reject(&mut self, reason: TtsServiceError) -> Result<(), JobError> {
        self.expect_status(JobStatus::Pending, JobStatus::Error)?;
        self.state = JobState::Error(reason);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Start a fresh cycle: back to pending, releasing any previous artifact
    pub fn reset(&mut self) {
        if self.status() != JobStatus::Pending {
            tracing::debug!(job_id = %self.id, from = %self.status(), "Resetting job");
        }
        self.state = JobState::Pending;
        self.chunk_count = None;
        self.finished_at = None;
    }

    /// Consume a finished job, yielding its artifact or its error
    pub fn into_outcome(self) -> Result<ArtifactHandle, TtsServiceError> {
        match self.state {
            JobState::Success(handle) => Ok(handle),
            JobState::Error(err) => Err(err),
            JobState::Pending | JobState::Processing => Err(JobError::NotFinished.into()),
        }
    }

    pub fn view(&self) -> JobView {
        let artifact_id = self.artifact().map(ArtifactHandle::id);
        JobView {
            id: self.id,
            display_name: self.display_name.clone(),
            output_filename: self.output_filename.clone(),
            source: self.source,
            status: self.status(),
            chunk_count: self.chunk_count,
            artifact_id,
            download_url: artifact_id.map(|id| format!("/api/artifacts/{}", id)),
            error: self.error().map(|e| e.to_string()),
            created_at: self.created_at,
            finished_at: self.finished_at,
        }
    }

    fn expect_status(&self, from: JobStatus, to: JobStatus) -> Result<(), JobError> {
        let current = self.status();
        if current != from {
            return Err(JobError::InvalidTransition { from: current, to });
        }
        Ok(())
    }
}

/// Read-only snapshot of a job, as handed to observers and API clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub id: Uuid,
    pub display_name: String,
    pub output_filename: String,
    pub source: JobSource,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Default download name: the display name with `.mp3` appended unless present
pub fn audio_filename(display_name: &str) -> String {
    let trimmed = display_name.trim();
    let base = if trimmed.is_empty() { "speech" } else { trimmed };
    if base.to_lowercase().ends_with(AUDIO_EXTENSION) {
        base.to_string()
    } else {
        format!("{}{}", base, AUDIO_EXTENSION)
    }
}
