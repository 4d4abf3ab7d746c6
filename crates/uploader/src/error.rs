//! Uploader error types.

use chunkpost_transfer::TransferError;

/// Errors surfaced by the transport boundary.
///
/// Failures carry no retryable/non-retryable distinction; the orchestrator
/// treats every chunk transport error as fatal to the batch.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("store rejected request: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from selection registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("selection is locked by a running upload")]
    UploadInProgress,

    #[error("unknown selection: {0}")]
    UnknownSelection(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by a batch run.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Batch started with no files. A notice, not a failure.
    #[error("no files selected")]
    EmptySelection,

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// A chunk failed to transmit; the batch was aborted at this point.
    #[error("chunk {chunk_index} of '{file_name}' failed: {source}")]
    ChunkUpload {
        file_name: String,
        chunk_index: u32,
        #[source]
        source: TransportError,
    },

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}
