use std::path::Path;

const TEXT_EXTENSION: &str = "txt";

/// 5 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestionError {
    #[error("{filename}: only .txt files are supported")]
    UnsupportedExtension { filename: String },
    #[error("{filename}: file is larger than {limit} bytes")]
    TooLarge { filename: String, limit: usize },
    #[error("{filename}: file is empty")]
    Empty { filename: String },
    #[error("{filename}: file is not valid UTF-8 text")]
    Unreadable { filename: String },
}

/// Validated text of one uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedFile {
    pub filename: String,
    /// File name without its extension, used to name the job and its audio
    pub display_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy)]
pub struct FileIngestion {
    max_bytes: usize,
}

impl Default for FileIngestion {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl FileIngestion {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn ingest(&self, filename: &str, bytes: &[u8]) -> Result<IngestedFile, IngestionError> {
        let path = Path::new(filename);
        let is_text = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(TEXT_EXTENSION))
            .unwrap_or(false);
        if !is_text {
            return Err(IngestionError::UnsupportedExtension {
                filename: filename.to_string(),
            });
        }

        if bytes.len() > self.max_bytes {
            return Err(IngestionError::TooLarge {
                filename: filename.to_string(),
                limit: self.max_bytes,
            });
        }

        let content = std::str::from_utf8(bytes).map_err(|_| IngestionError::Unreadable {
            filename: filename.to_string(),
        })?;
        if content.trim().is_empty() {
            return Err(IngestionError::Empty {
                filename: filename.to_string(),
            });
        }

        let display_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(filename)
            .to_string();

        tracing::debug!(
            filename = filename,
            size_bytes = bytes.len(),
            "File ingested"
        );

        Ok(IngestedFile {
            filename: filename.to_string(),
            display_name,
            content: content.to_string(),
        })
    }
}
