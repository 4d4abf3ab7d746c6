//! Batch upload orchestration for the chunkpost client.
//!
//! This crate drives a batch of selected files through the chunked-upload
//! pipeline. It is a library crate with no network dependencies — the host
//! app provides a `StoreTransport` implementation that bridges to the
//! actual HTTP client.
//!
//! # Pipeline
//!
//! 1. **Select** — files accumulate in the [`SelectionRegistry`]
//! 2. **Split** — each file gets a chunk plan from `chunkpost-transfer`
//! 3. **Upload** — chunks go out strictly in order, one at a time
//! 4. **Combine** — the store reassembles the file once all chunks landed
//! 5. **Report** — per-file outcomes plus a live progress event stream
//!
//! A chunk failure aborts the whole batch; a combine failure only skips
//! that file. See [`BatchUploader::run_batch`] for the exact policy.

pub mod batch;
pub mod error;
pub mod registry;
pub mod transport;
pub mod types;

// Re-export primary types for convenience.
pub use batch::BatchUploader;
pub use error::{RegistryError, TransportError, UploadError};
pub use registry::{FileSelection, SelectionId, SelectionRegistry};
pub use transport::StoreTransport;
pub use types::{BatchEvent, BatchReport, CombineFailure, CompletedFile, UploaderConfig};
