use serde::{Deserialize, Serialize};

/// Lifecycle of a single file's upload within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "uploading_chunks")]
    UploadingChunks,
    #[serde(rename = "combining")]
    Combining,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
}

/// Snapshot of batch-wide progress, published after every chunk ack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    /// Combined completion across all files, 0-100.
    pub overall_percent: u8,
    pub completed_files: u32,
    pub total_files: u32,
    /// File currently being transmitted.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_file: String,
    pub acknowledged_chunks: u32,
    pub total_chunks: u32,
}
