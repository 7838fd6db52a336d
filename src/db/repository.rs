//! PostgreSQL-backed implementations of the scan store and queue seams

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    queue_status_to_string, scan_status_to_string, QueueRow, ScanRow, TurnRow,
};
use crate::model::{Scan, Turn};
use crate::service::scan::{
    QueueError, QueueSnapshot, QueueStatus, QueueStatusProvider, ScanStore, StoreError,
};

/// Repository for scan and turn persistence
#[derive(Clone)]
pub struct PgScanStore {
    pool: PgPool,
}

impl PgScanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl ScanStore for PgScanStore {
    async fn create_scan(&self, scan: &Scan) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO scans (
                id, project_id, status, total_queries, total_results, error_turns,
                input_tokens, output_tokens, query_cost_usd, evaluation_cost_usd,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(scan.id)
        .bind(scan.project_id)
        .bind(scan_status_to_string(&scan.status))
        .bind(scan.total_queries)
        .bind(scan.total_results)
        .bind(scan.error_turns)
        .bind(scan.input_tokens)
        .bind(scan.output_tokens)
        .bind(scan.query_cost_usd)
        .bind(scan.evaluation_cost_usd)
        .bind(scan.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        tracing::debug!(scan = %scan.id, "Created scan record");
        Ok(())
    }

    async fn update_scan(&self, scan: &Scan) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE scans SET
                status = $2,
                total_results = $3,
                error_turns = $4,
                input_tokens = $5,
                output_tokens = $6,
                query_cost_usd = $7,
                evaluation_cost_usd = $8,
                avg_visibility = $9,
                avg_sentiment = $10,
                avg_ranking = $11,
                avg_recommendation = $12,
                resilience_final = $13,
                resilience_initial = $14,
                resilience_bonus = $15,
                brand_persistence = $16,
                sentiment_stability = $17,
                follow_up_active = $18,
                completed_at = $19
            WHERE id = $1
            "#,
        )
        .bind(scan.id)
        .bind(scan_status_to_string(&scan.status))
        .bind(scan.total_results)
        .bind(scan.error_turns)
        .bind(scan.input_tokens)
        .bind(scan.output_tokens)
        .bind(scan.query_cost_usd)
        .bind(scan.evaluation_cost_usd)
        .bind(scan.metrics.as_ref().map(|m| m.avg_visibility))
        .bind(scan.metrics.as_ref().and_then(|m| m.avg_sentiment))
        .bind(scan.metrics.as_ref().map(|m| m.avg_ranking))
        .bind(scan.metrics.as_ref().map(|m| m.avg_recommendation))
        .bind(scan.resilience.as_ref().map(|r| r.final_score))
        .bind(scan.resilience.as_ref().map(|r| r.initial_score))
        .bind(scan.resilience.as_ref().map(|r| r.conversational_bonus))
        .bind(scan.resilience.as_ref().map(|r| r.brand_persistence))
        .bind(scan.resilience.as_ref().map(|r| r.sentiment_stability))
        .bind(scan.resilience.as_ref().map(|r| r.follow_up_active))
        .bind(scan.completed_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(scan.id));
        }

        tracing::debug!(scan = %scan.id, status = ?scan.status, "Updated scan record");
        Ok(())
    }

    async fn insert_turn(&self, turn: &Turn) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO scan_turns (
                id, scan_id, query_text, model, level, follow_up_question,
                response_text, input_tokens, output_tokens, cost_usd,
                visibility, sentiment, ranking, recommendation, error, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(turn.id)
        .bind(turn.scan_id)
        .bind(&turn.query_text)
        .bind(&turn.model)
        .bind(turn.level as i16)
        .bind(&turn.follow_up_question)
        .bind(&turn.response_text)
        .bind(turn.input_tokens)
        .bind(turn.output_tokens)
        .bind(turn.cost_usd)
        .bind(turn.metrics.as_ref().map(|m| m.visibility))
        .bind(turn.metrics.as_ref().and_then(|m| m.sentiment))
        .bind(turn.metrics.as_ref().map(|m| m.ranking))
        .bind(turn.metrics.as_ref().map(|m| m.recommendation))
        .bind(&turn.error)
        .bind(turn.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn get_scan(&self, scan_id: Uuid) -> Result<Scan, StoreError> {
        let row: ScanRow = sqlx::query_as("SELECT * FROM scans WHERE id = $1")
            .bind(scan_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound(scan_id))?;

        Ok(row.into_domain())
    }

    async fn list_turns(&self, scan_id: Uuid) -> Result<Vec<Turn>, StoreError> {
        let rows: Vec<TurnRow> = sqlx::query_as(
            "SELECT * FROM scan_turns WHERE scan_id = $1 ORDER BY created_at, level",
        )
        .bind(scan_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(TurnRow::into_domain).collect())
    }
}

/// Queue records backed by the `scan_queue` table so pause/resume/cancel
/// signals survive process restarts
#[derive(Clone)]
pub struct PgQueueProvider {
    pool: PgPool,
}

impl PgQueueProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn queue_backend(e: sqlx::Error) -> QueueError {
    QueueError::Backend(e.to_string())
}

#[async_trait]
impl QueueStatusProvider for PgQueueProvider {
    async fn status(&self, scan_id: Uuid) -> Result<QueueStatus, QueueError> {
        let row: Option<QueueRow> = sqlx::query_as("SELECT * FROM scan_queue WHERE scan_id = $1")
            .bind(scan_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(queue_backend)?;

        // A scan without a queue record runs unrestricted
        Ok(row
            .map(|r| r.into_snapshot().status)
            .unwrap_or(QueueStatus::Running))
    }

    async fn set_status(&self, scan_id: Uuid, status: QueueStatus) -> Result<(), QueueError> {
        sqlx::query(
            r#"
            INSERT INTO scan_queue (scan_id, status, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (scan_id) DO UPDATE SET
                status = EXCLUDED.status,
                updated_at = NOW()
            "#,
        )
        .bind(scan_id)
        .bind(queue_status_to_string(&status))
        .execute(&self.pool)
        .await
        .map_err(queue_backend)?;

        tracing::debug!(scan = %scan_id, status = ?status, "Queue status updated");
        Ok(())
    }

    async fn report_progress(
        &self,
        scan_id: Uuid,
        current: u32,
        total: u32,
        message: &str,
    ) -> Result<(), QueueError> {
        sqlx::query(
            r#"
            INSERT INTO scan_queue (scan_id, status, progress_current, progress_total, progress_message, updated_at)
            VALUES ($1, 'running', $2, $3, $4, NOW())
            ON CONFLICT (scan_id) DO UPDATE SET
                progress_current = EXCLUDED.progress_current,
                progress_total = EXCLUDED.progress_total,
                progress_message = EXCLUDED.progress_message,
                updated_at = NOW()
            "#,
        )
        .bind(scan_id)
        .bind(current as i32)
        .bind(total as i32)
        .bind(message)
        .execute(&self.pool)
        .await
        .map_err(queue_backend)?;

        Ok(())
    }

    async fn snapshot(&self, scan_id: Uuid) -> Result<Option<QueueSnapshot>, QueueError> {
        let row: Option<QueueRow> = sqlx::query_as("SELECT * FROM scan_queue WHERE scan_id = $1")
            .bind(scan_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(queue_backend)?;

        Ok(row.map(QueueRow::into_snapshot))
    }
}
