//! Store transport trait — the network boundary.
//!
//! `StoreTransport` is implemented by the host app on top of its actual
//! HTTP client. Using a trait keeps the orchestration logic decoupled from
//! the wire and testable with mocks. Timeouts and retries, if any, belong
//! to the implementation; this core never retries.

use std::future::Future;
use std::pin::Pin;

use chunkpost_protocol::{ChunkUploadRequest, CombineRequest, CombineResponse};

use crate::error::TransportError;

/// Abstract connection to the remote store.
pub trait StoreTransport: Send + Sync {
    /// Submits one chunk as a multipart request and waits for the ack.
    fn upload_chunk(
        &self,
        header: &ChunkUploadRequest,
        data: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + '_>>;

    /// Asks the store to reassemble all uploaded chunks for a file.
    fn combine(
        &self,
        req: &CombineRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CombineResponse, TransportError>> + Send + '_>>;
}
