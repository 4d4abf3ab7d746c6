use sha2::{Digest, Sha256};

use crate::TransferError;

/// A contiguous byte range of a file, transmitted as one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Zero-based chunk index.
    pub index: u32,
    /// Byte offset within the file.
    pub offset: u64,
    /// Length of this chunk in bytes.
    pub length: u64,
}

impl ChunkSpan {
    /// Returns the chunk's bytes out of the full file content.
    pub fn slice<'a>(&self, content: &'a [u8]) -> &'a [u8] {
        let start = self.offset as usize;
        let end = (self.offset + self.length) as usize;
        &content[start..end]
    }
}

/// Computes the ordered chunk plan for a file of `byte_length` bytes.
///
/// Every span has length `chunk_size` except the last, which carries the
/// remainder. A zero-byte file yields exactly one empty span, so the store
/// always sees at least one chunk before combine is requested.
///
/// Fails only on `chunk_size == 0`.
pub fn split(byte_length: u64, chunk_size: u64) -> Result<Vec<ChunkSpan>, TransferError> {
    if chunk_size == 0 {
        return Err(TransferError::InvalidChunkSize(chunk_size));
    }

    if byte_length == 0 {
        return Ok(vec![ChunkSpan {
            index: 0,
            offset: 0,
            length: 0,
        }]);
    }

    let total = byte_length.div_ceil(chunk_size);
    let mut spans = Vec::with_capacity(total as usize);
    for index in 0..total {
        let offset = index * chunk_size;
        let length = chunk_size.min(byte_length - offset);
        spans.push(ChunkSpan {
            index: index as u32,
            offset,
            length,
        });
    }
    Ok(spans)
}

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
