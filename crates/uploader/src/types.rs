//! Data types for the batch upload flow.

use chunkpost_protocol::BatchProgress;
use chunkpost_transfer::DEFAULT_CHUNK_SIZE;

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Chunk boundary size in bytes.
    pub chunk_size: u64,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Event emitted during a batch run.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Published after every single chunk acknowledgment.
    Progress(BatchProgress),
    /// All chunks for a file landed; combine request is going out.
    Combining { file_name: String },
    /// The store reassembled a file.
    FileCompleted { file_name: String, url: String },
    /// Combine failed for one file; the batch moves on to the next.
    CombineFailed { file_name: String, error: String },
    /// A chunk failed; the whole batch stops here.
    Aborted { file_name: String, chunk_index: u32 },
    /// Every file was processed (some combines may still have failed).
    BatchFinished {
        completed_files: u32,
        total_files: u32,
        fully_successful: bool,
    },
}

/// A file the store confirmed as reassembled.
#[derive(Debug, Clone)]
pub struct CompletedFile {
    pub file_id: String,
    pub file_name: String,
    pub url: String,
}

/// A file whose chunks all landed but whose combine call failed.
#[derive(Debug, Clone)]
pub struct CombineFailure {
    pub file_id: String,
    pub file_name: String,
    pub error: String,
}

/// Outcome of a batch in which every file got its chunks through.
///
/// An aborted batch never produces a report; it surfaces as
/// `UploadError::ChunkUpload` instead.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub completed: Vec<CompletedFile>,
    pub combine_failed: Vec<CombineFailure>,
}

impl BatchReport {
    /// `true` when every file in the batch was combined successfully.
    pub fn is_full_success(&self) -> bool {
        self.combine_failed.is_empty()
    }

    pub fn total_files(&self) -> usize {
        self.completed.len() + self.combine_failed.len()
    }
}
