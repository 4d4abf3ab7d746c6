use chunkpost_protocol::BatchProgress;

use crate::session::UploadSession;

/// Derives the single batch percentage from per-file chunk completion.
///
/// `round(100 * (completed_files + acknowledged/total_chunks) / total_files)`.
/// This is the sole progress signal exposed outward, so the orchestrator
/// recomputes it after every single chunk ack rather than debouncing.
pub fn overall_percent(
    completed_files: u32,
    acknowledged: u32,
    total_chunks: u32,
    total_files: u32,
) -> u8 {
    if total_files == 0 {
        return 0;
    }
    let file_fraction = if total_chunks == 0 {
        0.0
    } else {
        f64::from(acknowledged) / f64::from(total_chunks)
    };
    let percent = 100.0 * (f64::from(completed_files) + file_fraction) / f64::from(total_files);
    percent.round().clamp(0.0, 100.0) as u8
}

/// Builds a progress snapshot for the file currently in flight.
pub fn batch_progress(
    completed_files: u32,
    total_files: u32,
    session: &UploadSession,
) -> BatchProgress {
    BatchProgress {
        overall_percent: overall_percent(
            completed_files,
            session.acknowledged(),
            session.total_chunks(),
            total_files,
        ),
        completed_files,
        total_files,
        current_file: session.file_name().to_string(),
        acknowledged_chunks: session.acknowledged(),
        total_chunks: session.total_chunks(),
    }
}
