//! Queue-status collaborator
//!
//! The orchestrator reads the status field and writes progress; the UI layer
//! writes status changes. Writes are last-write-wins and idempotent.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::QueueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Running,
    Paused,
    Cancelled,
}

/// Point-in-time view of one scan's queue record
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QueueSnapshot {
    pub status: QueueStatus,
    pub progress_current: u32,
    pub progress_total: u32,
    pub progress_message: String,
}

#[async_trait]
pub trait QueueStatusProvider: Send + Sync {
    /// Current control status; scans without a record are treated as running
    async fn status(&self, scan_id: Uuid) -> Result<QueueStatus, QueueError>;

    /// Status write, used by the UI layer for pause/resume/cancel
    async fn set_status(&self, scan_id: Uuid, status: QueueStatus) -> Result<(), QueueError>;

    /// Coarse progress report for UI polling
    async fn report_progress(
        &self,
        scan_id: Uuid,
        current: u32,
        total: u32,
        message: &str,
    ) -> Result<(), QueueError>;

    async fn snapshot(&self, scan_id: Uuid) -> Result<Option<QueueSnapshot>, QueueError>;
}

/// In-process queue backend for API-triggered runs and tests
pub struct InMemoryQueue {
    records: RwLock<HashMap<Uuid, QueueSnapshot>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueStatusProvider for InMemoryQueue {
    async fn status(&self, scan_id: Uuid) -> Result<QueueStatus, QueueError> {
        let records = self.records.read().await;
        Ok(records
            .get(&scan_id)
            .map(|r| r.status)
            .unwrap_or(QueueStatus::Running))
    }

    async fn set_status(&self, scan_id: Uuid, status: QueueStatus) -> Result<(), QueueError> {
        let mut records = self.records.write().await;
        records
            .entry(scan_id)
            .and_modify(|r| r.status = status)
            .or_insert_with(|| QueueSnapshot {
                status,
                progress_current: 0,
                progress_total: 0,
                progress_message: String::new(),
            });
        Ok(())
    }

    async fn report_progress(
        &self,
        scan_id: Uuid,
        current: u32,
        total: u32,
        message: &str,
    ) -> Result<(), QueueError> {
        let mut records = self.records.write().await;
        let record = records.entry(scan_id).or_insert_with(|| QueueSnapshot {
            status: QueueStatus::Running,
            progress_current: 0,
            progress_total: 0,
            progress_message: String::new(),
        });
        record.progress_current = current;
        record.progress_total = total;
        record.progress_message = message.to_string();
        Ok(())
    }

    async fn snapshot(&self, scan_id: Uuid) -> Result<Option<QueueSnapshot>, QueueError> {
        let records = self.records.read().await;
        Ok(records.get(&scan_id).cloned())
    }
}
