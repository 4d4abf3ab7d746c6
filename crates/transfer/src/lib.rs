//! Chunk planning, per-file upload sessions and progress math.
//!
//! This crate is the pure layer of the upload pipeline: it decides how a
//! file is cut into chunks, tracks the per-file state machine while chunks
//! are acknowledged, and turns per-chunk progress into the single batch
//! percentage the UI shows. Nothing here touches the network.

mod progress;
mod session;
mod splitter;

pub use progress::{batch_progress, overall_percent};
pub use session::{UploadSession, derive_file_id, sanitize_file_id, strip_extension};
pub use splitter::{ChunkSpan, checksum_bytes, split};

/// Default chunk size: 5 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(u64),

    #[error("invalid session transition: {0}")]
    InvalidTransition(String),
}
