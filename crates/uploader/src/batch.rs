//! Batch upload orchestrator.
//!
//! Drives every selected file through split, sequential chunk upload and
//! combine, publishing progress events along the way. Failure policy:
//! a chunk transmission failure aborts the entire batch on the spot, while
//! a combine failure only skips that file and the batch continues.

use std::sync::Arc;

use chunkpost_protocol::{ChunkUploadRequest, CombineRequest};
use chunkpost_transfer::{UploadSession, batch_progress, checksum_bytes};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::UploadError;
use crate::registry::{FileSelection, SelectionRegistry};
use crate::transport::StoreTransport;
use crate::types::{BatchEvent, BatchReport, CombineFailure, CompletedFile, UploaderConfig};

/// Orchestrates one batch of files at a time.
pub struct BatchUploader {
    config: UploaderConfig,
    events_tx: mpsc::Sender<BatchEvent>,
    events_rx: Option<mpsc::Receiver<BatchEvent>>,
}

impl Default for BatchUploader {
    fn default() -> Self {
        Self::new(UploaderConfig::default())
    }
}

impl BatchUploader {
    /// Creates an uploader with the given chunking configuration.
    pub fn new(config: UploaderConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            config,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<BatchEvent>> {
        self.events_rx.take()
    }

    /// Runs the whole selection through the upload pipeline.
    ///
    /// Files are processed strictly one at a time in selection order, and
    /// chunks within a file strictly in index order — chunk `i + 1` is never
    /// sent before chunk `i` is acknowledged.
    ///
    /// The registry is frozen for the duration of the run. On success (every
    /// file got its chunks through, combines may still have failed) it is
    /// cleared; on abort it is unlocked but left populated so the user can
    /// retry.
    ///
    /// An empty selection is a no-op surfaced as
    /// [`UploadError::EmptySelection`]; no transport calls are made.
    pub async fn run_batch(
        &self,
        registry: &SelectionRegistry,
        transport: &dyn StoreTransport,
    ) -> Result<BatchReport, UploadError> {
        if registry.is_empty() {
            warn!("batch requested with no files selected");
            return Err(UploadError::EmptySelection);
        }

        let files = registry.freeze()?;
        if files.is_empty() {
            registry.thaw();
            return Err(UploadError::EmptySelection);
        }

        info!(files = files.len(), "starting batch upload");

        match self.drive(&files, transport).await {
            Ok(report) => {
                let completed_files = report.completed.len() as u32;
                let total_files = files.len() as u32;
                info!(
                    completed = completed_files,
                    combine_failed = report.combine_failed.len(),
                    "batch finished"
                );
                let _ = self
                    .events_tx
                    .send(BatchEvent::BatchFinished {
                        completed_files,
                        total_files,
                        fully_successful: report.is_full_success(),
                    })
                    .await;
                registry.clear();
                Ok(report)
            }
            Err(e) => {
                registry.thaw();
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        files: &[Arc<FileSelection>],
        transport: &dyn StoreTransport,
    ) -> Result<BatchReport, UploadError> {
        let total_files = files.len() as u32;
        let mut completed_files = 0u32;
        let mut report = BatchReport::default();

        for file in files {
            let mut session =
                UploadSession::new(&file.name, file.byte_length(), self.config.chunk_size)?;
            session.start()?;

            debug!(
                file = %file.name,
                file_id = %session.file_id(),
                chunks = session.total_chunks(),
                "uploading file"
            );

            let spans = session.spans().to_vec();
            for span in spans {
                let data = span.slice(&file.content);
                let header = ChunkUploadRequest {
                    file_id: session.file_id().to_string(),
                    chunk_index: span.index,
                    total_chunks: session.total_chunks(),
                    file_name: session.file_name().to_string(),
                    checksum: checksum_bytes(data),
                };

                if let Err(e) = transport.upload_chunk(&header, data).await {
                    session.fail();
                    error!(
                        file = %file.name,
                        chunk = span.index,
                        error = %e,
                        "chunk upload failed, aborting batch"
                    );
                    let _ = self
                        .events_tx
                        .send(BatchEvent::Aborted {
                            file_name: file.name.clone(),
                            chunk_index: span.index,
                        })
                        .await;
                    return Err(UploadError::ChunkUpload {
                        file_name: file.name.clone(),
                        chunk_index: span.index,
                        source: e,
                    });
                }

                session.ack_chunk()?;
                let progress = batch_progress(completed_files, total_files, &session);
                let _ = self.events_tx.send(BatchEvent::Progress(progress)).await;
            }

            session.begin_combine()?;
            let _ = self
                .events_tx
                .send(BatchEvent::Combining {
                    file_name: file.name.clone(),
                })
                .await;

            let combine_req = CombineRequest {
                file_id: session.file_id().to_string(),
            };
            match transport.combine(&combine_req).await {
                Ok(resp) => {
                    session.complete()?;
                    completed_files += 1;
                    info!(file = %file.name, url = %resp.url, "file combined");
                    let _ = self
                        .events_tx
                        .send(BatchEvent::FileCompleted {
                            file_name: file.name.clone(),
                            url: resp.url.clone(),
                        })
                        .await;
                    report.completed.push(CompletedFile {
                        file_id: session.file_id().to_string(),
                        file_name: file.name.clone(),
                        url: resp.url,
                    });
                }
                Err(e) => {
                    session.fail();
                    warn!(
                        file = %file.name,
                        error = %e,
                        "combine failed, continuing with next file"
                    );
                    let _ = self
                        .events_tx
                        .send(BatchEvent::CombineFailed {
                            file_name: file.name.clone(),
                            error: e.to_string(),
                        })
                        .await;
                    report.combine_failed.push(CombineFailure {
                        file_id: session.file_id().to_string(),
                        file_name: file.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use chunkpost_protocol::CombineResponse;
    use std::collections::{HashMap, HashSet};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    /// Mock store that records every call and can be told to fail
    /// specific chunks or combines.
    struct MockStore {
        uploads: Mutex<Vec<(ChunkUploadRequest, Vec<u8>)>>,
        combines: Mutex<Vec<CombineRequest>>,
        /// (file name without extension, chunk index) pairs to reject.
        fail_chunks: HashSet<(String, u32)>,
        /// Sanitized file names whose combine should be rejected.
        fail_combines: HashSet<String>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                uploads: Mutex::new(Vec::new()),
                combines: Mutex::new(Vec::new()),
                fail_chunks: HashSet::new(),
                fail_combines: HashSet::new(),
            }
        }

        fn fail_chunk(mut self, file_name: &str, index: u32) -> Self {
            self.fail_chunks.insert((file_name.to_string(), index));
            self
        }

        fn fail_combine(mut self, sanitized_name: &str) -> Self {
            self.fail_combines.insert(sanitized_name.to_string());
            self
        }

        fn upload_count(&self) -> usize {
            self.uploads.lock().unwrap().len()
        }

        fn combine_count(&self) -> usize {
            self.combines.lock().unwrap().len()
        }
    }

    impl StoreTransport for MockStore {
        fn upload_chunk(
            &self,
            header: &ChunkUploadRequest,
            data: &[u8],
        ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + '_>> {
            let fail = self
                .fail_chunks
                .contains(&(header.file_name.clone(), header.chunk_index));
            self.uploads
                .lock()
                .unwrap()
                .push((header.clone(), data.to_vec()));

            Box::pin(async move {
                if fail {
                    Err(TransportError::Store("chunk rejected".into()))
                } else {
                    Ok(())
                }
            })
        }

        fn combine(
            &self,
            req: &CombineRequest,
        ) -> Pin<Box<dyn Future<Output = Result<CombineResponse, TransportError>> + Send + '_>>
        {
            self.combines.lock().unwrap().push(req.clone());
            // file_id is `<millis>_<sanitized name>`.
            let name_part = req
                .file_id
                .split_once('_')
                .map(|(_, n)| n.to_string())
                .unwrap_or_default();
            let fail = self.fail_combines.contains(&name_part);
            let url = format!("https://store.example/files/{}", req.file_id);

            Box::pin(async move {
                if fail {
                    Err(TransportError::Store("combine rejected".into()))
                } else {
                    Ok(CombineResponse { url })
                }
            })
        }
    }

    fn registry_with(files: &[(&str, usize)]) -> SelectionRegistry {
        let registry = SelectionRegistry::new();
        for (name, size) in files {
            registry.add(name, vec![0xAB; *size]).unwrap();
        }
        registry
    }

    async fn drain(mut rx: mpsc::Receiver<BatchEvent>) -> Vec<BatchEvent> {
        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        events
    }

    #[tokio::test]
    async fn single_file_three_chunks() {
        // Scenario A, scaled down: 12 bytes at 5-byte chunks.
        let registry = registry_with(&[("report.pdf", 12)]);
        let store = MockStore::new();
        let mut uploader = BatchUploader::new(UploaderConfig { chunk_size: 5 });
        let events_rx = uploader.take_events().unwrap();

        let report = uploader.run_batch(&registry, &store).await.unwrap();
        assert!(report.is_full_success());
        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.completed[0].file_name, "report.pdf");
        assert!(registry.is_empty());
        assert!(!registry.is_busy());

        // 3 chunks of 5, 5, 2 bytes, strictly ascending, then one combine.
        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 3);
        for (i, (header, data)) in uploads.iter().enumerate() {
            assert_eq!(header.chunk_index, i as u32);
            assert_eq!(header.total_chunks, 3);
            assert_eq!(header.file_name, "report");
            assert_eq!(header.checksum, checksum_bytes(data));
        }
        assert_eq!(uploads[0].1.len(), 5);
        assert_eq!(uploads[1].1.len(), 5);
        assert_eq!(uploads[2].1.len(), 2);
        assert_eq!(store.combine_count(), 1);
        drop(uploads);

        drop(uploader);
        let events = drain(events_rx).await;
        let percents: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                BatchEvent::Progress(p) => Some(p.overall_percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents, [33, 67, 100]);
        assert!(matches!(
            events.last(),
            Some(BatchEvent::BatchFinished {
                fully_successful: true,
                completed_files: 1,
                total_files: 1,
            })
        ));
    }

    #[tokio::test]
    async fn chunk_failure_aborts_whole_batch() {
        // Scenario B: file 1's second of three chunks fails; file 2 never starts.
        let registry = registry_with(&[("a.bin", 12), ("b.bin", 4)]);
        let store = MockStore::new().fail_chunk("a", 1);
        let mut uploader = BatchUploader::new(UploaderConfig { chunk_size: 5 });
        let events_rx = uploader.take_events().unwrap();

        let err = uploader.run_batch(&registry, &store).await.unwrap_err();
        match err {
            UploadError::ChunkUpload {
                file_name,
                chunk_index,
                ..
            } => {
                assert_eq!(file_name, "a.bin");
                assert_eq!(chunk_index, 1);
            }
            other => panic!("expected ChunkUpload error, got {other:?}"),
        }

        // Chunks 0 and 1 were attempted; nothing for file 2, no combine.
        assert_eq!(store.upload_count(), 2);
        assert_eq!(store.combine_count(), 0);

        // Registry kept for retry, unlocked.
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_busy());

        drop(uploader);
        let events = drain(events_rx).await;
        assert!(events.iter().any(|e| matches!(
            e,
            BatchEvent::Aborted {
                chunk_index: 1,
                ..
            }
        )));
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, BatchEvent::BatchFinished { .. }))
        );
    }

    #[tokio::test]
    async fn combine_failure_skips_file_and_continues() {
        // Scenario C: both chunk phases succeed, file 1's combine fails.
        let registry = registry_with(&[("a.bin", 6), ("b.bin", 6)]);
        let store = MockStore::new().fail_combine("abin");
        let mut uploader = BatchUploader::new(UploaderConfig { chunk_size: 5 });
        let events_rx = uploader.take_events().unwrap();

        let report = uploader.run_batch(&registry, &store).await.unwrap();
        assert!(!report.is_full_success());
        assert_eq!(report.total_files(), 2);
        assert_eq!(report.combine_failed.len(), 1);
        assert_eq!(report.combine_failed[0].file_name, "a.bin");
        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.completed[0].file_name, "b.bin");

        // Both files had all chunks sent, both combines attempted.
        assert_eq!(store.upload_count(), 4);
        assert_eq!(store.combine_count(), 2);

        // Chunks all confirmed, so the registry is still cleared.
        assert!(registry.is_empty());

        drop(uploader);
        let events = drain(events_rx).await;
        assert!(
            events
                .iter()
                .any(|e| matches!(e, BatchEvent::CombineFailed { file_name, .. } if file_name == "a.bin"))
        );
        assert!(matches!(
            events.last(),
            Some(BatchEvent::BatchFinished {
                fully_successful: false,
                completed_files: 1,
                total_files: 2,
            })
        ));
    }

    #[tokio::test]
    async fn empty_selection_is_a_no_op() {
        // Scenario D.
        let registry = SelectionRegistry::new();
        let store = MockStore::new();
        let uploader = BatchUploader::default();

        let err = uploader.run_batch(&registry, &store).await.unwrap_err();
        assert!(matches!(err, UploadError::EmptySelection));
        assert_eq!(store.upload_count(), 0);
        assert_eq!(store.combine_count(), 0);
        assert!(!registry.is_busy());
    }

    #[tokio::test]
    async fn progress_non_decreasing_across_batch() {
        let registry = registry_with(&[("a.bin", 12), ("b.bin", 3), ("c.bin", 20)]);
        let store = MockStore::new();
        let mut uploader = BatchUploader::new(UploaderConfig { chunk_size: 5 });
        let events_rx = uploader.take_events().unwrap();

        uploader.run_batch(&registry, &store).await.unwrap();
        drop(uploader);

        let events = drain(events_rx).await;
        let mut last = 0u8;
        let mut final_percent = 0u8;
        for e in &events {
            if let BatchEvent::Progress(p) = e {
                assert!(
                    p.overall_percent >= last,
                    "progress went backwards: {last} -> {}",
                    p.overall_percent
                );
                last = p.overall_percent;
                final_percent = p.overall_percent;
            }
        }
        assert_eq!(final_percent, 100);
    }

    #[tokio::test]
    async fn chunks_strictly_ordered_per_file() {
        let registry = registry_with(&[("a.bin", 17), ("b.bin", 9)]);
        let store = MockStore::new();
        let uploader = BatchUploader::new(UploaderConfig { chunk_size: 4 });

        uploader.run_batch(&registry, &store).await.unwrap();

        let uploads = store.uploads.lock().unwrap();
        let mut per_file: HashMap<String, Vec<u32>> = HashMap::new();
        for (header, _) in uploads.iter() {
            per_file
                .entry(header.file_id.clone())
                .or_default()
                .push(header.chunk_index);
        }
        assert_eq!(per_file.len(), 2);
        for (file_id, indices) in per_file {
            let expected: Vec<u32> = (0..indices.len() as u32).collect();
            assert_eq!(indices, expected, "out-of-order chunks for {file_id}");
        }
    }

    #[tokio::test]
    async fn zero_byte_file_uploads_one_empty_chunk() {
        let registry = registry_with(&[("empty.txt", 0)]);
        let store = MockStore::new();
        let uploader = BatchUploader::default();

        let report = uploader.run_batch(&registry, &store).await.unwrap();
        assert_eq!(report.completed.len(), 1);

        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0.total_chunks, 1);
        assert!(uploads[0].1.is_empty());
        drop(uploads);
        assert_eq!(store.combine_count(), 1);
    }

    #[tokio::test]
    async fn identical_names_get_distinct_file_ids() {
        let registry = registry_with(&[("photo.png", 3), ("photo.png", 3)]);
        let store = MockStore::new();
        let uploader = BatchUploader::default();

        let report = uploader.run_batch(&registry, &store).await.unwrap();
        assert_eq!(report.completed.len(), 2);
        assert_ne!(report.completed[0].file_id, report.completed[1].file_id);
    }

    #[tokio::test]
    async fn invalid_chunk_size_fails_before_any_transport_call() {
        let registry = registry_with(&[("a.bin", 10)]);
        let store = MockStore::new();
        let uploader = BatchUploader::new(UploaderConfig { chunk_size: 0 });

        let err = uploader.run_batch(&registry, &store).await.unwrap_err();
        assert!(matches!(err, UploadError::Transfer(_)));
        assert_eq!(store.upload_count(), 0);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_busy());
    }

    #[tokio::test]
    async fn registry_frozen_while_batch_runs() {
        let registry = registry_with(&[("a.bin", 5)]);
        // Freeze manually to simulate a concurrent run.
        registry.freeze().unwrap();

        let store = MockStore::new();
        let uploader = BatchUploader::default();
        let err = uploader.run_batch(&registry, &store).await.unwrap_err();
        assert!(matches!(
            err,
            UploadError::Registry(crate::error::RegistryError::UploadInProgress)
        ));
        assert_eq!(store.upload_count(), 0);
    }

    #[test]
    fn take_events_once() {
        let mut uploader = BatchUploader::default();
        assert!(uploader.take_events().is_some());
        assert!(uploader.take_events().is_none());
    }
}
