use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use chunkpost_protocol::UploadStatus;

use crate::splitter::{ChunkSpan, split};
use crate::TransferError;

/// Last file-id timestamp handed out, used to keep ids strictly increasing.
static LAST_ID_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Strips everything outside `[a-zA-Z0-9]` from a file name.
pub fn sanitize_file_id(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Returns the file name without its extension.
///
/// A name with no dot is returned unchanged.
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Derives a batch-unique file id: `<millis>_<sanitized name>`.
///
/// The millisecond timestamp is forced strictly increasing across calls, so
/// two selections with identical names never collide even within the same
/// millisecond.
pub fn derive_file_id(name: &str) -> String {
    let now = Utc::now().timestamp_millis();
    let prev = LAST_ID_MILLIS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(0);
    let millis = now.max(prev + 1);
    format!("{millis}_{}", sanitize_file_id(name))
}

/// Per-file upload state for one batch run.
///
/// Drives `Pending -> UploadingChunks -> Combining -> Completed | Failed`.
/// Owned exclusively by the orchestrator; chunks are acknowledged strictly
/// in order, so `acknowledged` only ever grows.
#[derive(Debug)]
pub struct UploadSession {
    file_id: String,
    file_name: String,
    spans: Vec<ChunkSpan>,
    acknowledged: u32,
    status: UploadStatus,
}

impl UploadSession {
    /// Creates a pending session with its chunk plan computed up front.
    pub fn new(name: &str, byte_length: u64, chunk_size: u64) -> Result<Self, TransferError> {
        let spans = split(byte_length, chunk_size)?;
        Ok(Self {
            file_id: derive_file_id(name),
            file_name: strip_extension(name).to_string(),
            spans,
            acknowledged: 0,
            status: UploadStatus::Pending,
        })
    }

    /// Moves the session into `UploadingChunks`.
    pub fn start(&mut self) -> Result<(), TransferError> {
        if self.status != UploadStatus::Pending {
            return Err(self.bad_transition("start"));
        }
        self.status = UploadStatus::UploadingChunks;
        Ok(())
    }

    /// Records one chunk acknowledgment, returning the new count.
    pub fn ack_chunk(&mut self) -> Result<u32, TransferError> {
        if self.status != UploadStatus::UploadingChunks {
            return Err(self.bad_transition("ack_chunk"));
        }
        if self.acknowledged >= self.total_chunks() {
            return Err(TransferError::InvalidTransition(format!(
                "ack_chunk past {} chunks for {}",
                self.total_chunks(),
                self.file_id
            )));
        }
        self.acknowledged += 1;
        Ok(self.acknowledged)
    }

    /// Moves to `Combining`. All chunks must be acknowledged first.
    pub fn begin_combine(&mut self) -> Result<(), TransferError> {
        if self.status != UploadStatus::UploadingChunks || !self.all_acknowledged() {
            return Err(self.bad_transition("begin_combine"));
        }
        self.status = UploadStatus::Combining;
        Ok(())
    }

    /// Marks the session completed after a successful combine.
    pub fn complete(&mut self) -> Result<(), TransferError> {
        if self.status != UploadStatus::Combining {
            return Err(self.bad_transition("complete"));
        }
        self.status = UploadStatus::Completed;
        Ok(())
    }

    /// Marks the session failed. Valid from any non-terminal state.
    pub fn fail(&mut self) {
        self.status = UploadStatus::Failed;
    }

    /// `true` once every chunk in the plan has been acknowledged.
    pub fn all_acknowledged(&self) -> bool {
        self.acknowledged == self.total_chunks()
    }

    /// Fraction of this file's chunks acknowledged, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        f64::from(self.acknowledged) / f64::from(self.total_chunks())
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn spans(&self) -> &[ChunkSpan] {
        &self.spans
    }

    pub fn total_chunks(&self) -> u32 {
        self.spans.len() as u32
    }

    pub fn acknowledged(&self) -> u32 {
        self.acknowledged
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    fn bad_transition(&self, op: &str) -> TransferError {
        TransferError::InvalidTransition(format!("{op} in {:?} for {}", self.status, self.file_id))
    }
}
