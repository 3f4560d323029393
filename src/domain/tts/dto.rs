use crate::domain::job::JobView;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for POST /api/tts/synthesize
#[derive(Debug, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Download name; defaults to "speech"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// An uploaded text file, as sent by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFile {
    pub filename: String,
    pub content: String,
}

/// Request for POST /api/batches
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub files: Vec<BatchFile>,
    /// Also produce one job that reads every accepted file in order
    #[serde(default)]
    pub merge_files: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// A file that never became a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedFile {
    pub filename: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Running,
    Completed,
    Rejected,
}

/// Snapshot of a batch, as returned by GET /api/batches/:id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchView {
    pub id: Uuid,
    pub status: BatchStatus,
    pub progress: u8,
    pub cancelled: bool,
    pub success_count: usize,
    pub jobs: Vec<JobView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for POST /api/batches
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchCreatedResponse {
    pub batch: BatchView,
    pub rejected_files: Vec<RejectedFile>,
}
