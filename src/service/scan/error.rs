//! Error types for scan orchestration

use thiserror::Error;
use uuid::Uuid;

/// Persistence-seam errors, independent of any concrete backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Scan not found: {0}")]
    NotFound(Uuid),
}

/// Queue-status-seam errors
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue backend error: {0}")]
    Backend(String),
}

/// Orchestration-level outcomes. Per-turn provider failures never surface
/// here; they are recorded as error turns and the scan continues.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Cooperative abort requested through the queue; not a failure
    #[error("Scan cancelled by queue signal")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}
