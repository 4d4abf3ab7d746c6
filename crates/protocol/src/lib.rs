//! Wire types for the chunkpost client-store upload protocol.
//!
//! The store exposes two endpoints: a multipart chunk upload and a combine
//! call that reassembles previously uploaded chunks into the final artifact.
//! This crate only defines the typed payloads; the actual transport lives
//! behind the `StoreTransport` trait in `chunkpost-uploader`.

pub mod messages;
pub mod types;

pub use messages::{ChunkUploadRequest, CombineRequest, CombineResponse};
pub use types::{BatchProgress, UploadStatus};
