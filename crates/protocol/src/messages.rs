//! Request/response payloads for the store's upload endpoints.

use serde::{Deserialize, Serialize};

/// Header accompanying one chunk of file data.
///
/// The chunk bytes themselves travel next to this header as a raw
/// multipart part; they are never embedded in the JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkUploadRequest {
    /// Batch-unique file identifier (timestamp + sanitized name).
    pub file_id: String,
    /// Zero-based index of this chunk.
    pub chunk_index: u32,
    /// Total number of chunks the store should expect for this file.
    pub total_chunks: u32,
    /// Original file name with the extension stripped.
    pub file_name: String,
    /// SHA-256 hex digest of the chunk bytes (empty means no verification).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
}

/// Asks the store to reassemble all uploaded chunks for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineRequest {
    pub file_id: String,
}

/// Store response to a successful combine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineResponse {
    /// Location of the reassembled artifact.
    pub url: String,
}
