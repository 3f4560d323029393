pub mod audio;
pub mod ingestion;
pub mod job;
pub mod tts;
