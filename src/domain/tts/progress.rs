//! Progress arithmetic shared by the single-job and batch pipelines.
//!
//! All percentages are integers in `0..=100`, floored. Intra-chunk progress is
//! carried as a percentage too, so the job and batch formulas reduce to exact
//! integer division.

/// Average MP3 bytes the speech API returns per input character
pub const DEFAULT_BYTES_PER_CHAR: u64 = 50;

/// Highest percentage reported for a response whose length is unknown,
/// until the body has been fully read
pub const UNKNOWN_LENGTH_CAP: u8 = 95;

/// Estimation policy for byte-level progress of one synthesis request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteProgressPolicy {
    pub bytes_per_char: u64,
    pub unknown_length_cap: u8,
}

impl Default for ByteProgressPolicy {
    fn default() -> Self {
        Self {
            bytes_per_char: DEFAULT_BYTES_PER_CHAR,
            unknown_length_cap: UNKNOWN_LENGTH_CAP,
        }
    }
}

impl ByteProgressPolicy {
    pub fn new(bytes_per_char: u64) -> Self {
        Self {
            bytes_per_char: bytes_per_char.max(1),
            ..Self::default()
        }
    }

    /// Percentage of one response received so far.
    ///
    /// With a declared content length this is exact. Without one the total is
    /// estimated from the input length and the result never passes
    /// `unknown_length_cap`.
    pub fn percent(&self, received: u64, content_length: Option<u64>, text_chars: usize) -> u8 {
        match content_length {
            Some(total) if total > 0 => ratio_percent(received, total),
            _ => {
                let estimated = (text_chars as u64).saturating_mul(self.bytes_per_char).max(1);
                ratio_percent(received, estimated).min(self.unknown_length_cap)
            }
        }
    }
}

/// Progress of the chunk currently in flight within one job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    /// Position of the chunk within the job, `0..total`
    pub index: usize,
    /// Number of chunks the job was segmented into
    pub total: usize,
    /// Completion of this chunk's request, `0..=100`
    pub percent: u8,
}

/// `floor(((index + percent/100) / total) * 100)`
pub fn job_percent(progress: ChunkProgress) -> u8 {
    if progress.total == 0 {
        return 100;
    }
    let done = progress.index as u64 * 100 + progress.percent.min(100) as u64;
    clamp_percent(done / progress.total as u64)
}

/// `floor(((completed_jobs + (index + percent/100) / total) / total_jobs) * 100)`
pub fn batch_percent(completed_jobs: usize, progress: ChunkProgress, total_jobs: usize) -> u8 {
    if total_jobs == 0 {
        return 100;
    }
    let chunks = progress.total.max(1) as u64;
    let within_job = progress.index as u64 * 100 + progress.percent.min(100) as u64;
    let numerator = completed_jobs as u64 * chunks * 100 + within_job;
    clamp_percent(numerator / (chunks * total_jobs as u64))
}

/// Batch progress once `completed_jobs` have reached a terminal state
pub fn settled_batch_percent(completed_jobs: usize, total_jobs: usize) -> u8 {
    if total_jobs == 0 {
        return 100;
    }
    clamp_percent(completed_jobs as u64 * 100 / total_jobs as u64)
}

fn ratio_percent(part: u64, whole: u64) -> u8 {
    clamp_percent(part.saturating_mul(100) / whole.max(1))
}

fn clamp_percent(value: u64) -> u8 {
    value.min(100) as u8
}

/// Forwards only percentages that move forward
#[derive(Debug, Default)]
pub struct MonotonicProgress {
    last: Option<u8>,
}

impl MonotonicProgress {
    pub fn advance(&mut self, percent: u8) -> Option<u8> {
        match self.last {
            Some(last) if percent <= last => None,
            _ => {
                self.last = Some(percent);
                Some(percent)
            }
        }
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }
}
