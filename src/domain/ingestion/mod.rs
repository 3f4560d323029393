pub mod service;

pub use service::{FileIngestion, IngestedFile, IngestionError};
