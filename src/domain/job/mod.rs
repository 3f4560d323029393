pub mod error;
pub mod model;

pub use error::JobError;
pub use model::{audio_filename, Job, JobSource, JobStatus, JobView};
