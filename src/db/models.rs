//! Database models for scans, turns and the scan queue

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::model::{ResilienceScore, Scan, ScanMetrics, ScanStatus, Turn, TurnMetrics};
use crate::service::scan::{QueueSnapshot, QueueStatus};

/// Database representation of a scan
#[derive(Debug, Clone, FromRow)]
pub struct ScanRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: String,
    pub total_queries: i32,
    pub total_results: i32,
    pub error_turns: i32,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub query_cost_usd: f64,
    pub evaluation_cost_usd: f64,
    pub avg_visibility: Option<f64>,
    pub avg_sentiment: Option<f64>,
    pub avg_ranking: Option<f64>,
    pub avg_recommendation: Option<f64>,
    pub resilience_final: Option<f64>,
    pub resilience_initial: Option<f64>,
    pub resilience_bonus: Option<f64>,
    pub brand_persistence: Option<f64>,
    pub sentiment_stability: Option<f64>,
    pub follow_up_active: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScanRow {
    /// Convert database row to domain model. A NULL `avg_visibility` marks a
    /// scan without aggregated metrics, a NULL `resilience_final` a scan
    /// without a resilience score.
    pub fn into_domain(self) -> Scan {
        let metrics = self.avg_visibility.map(|avg_visibility| ScanMetrics {
            avg_visibility,
            avg_sentiment: self.avg_sentiment,
            avg_ranking: self.avg_ranking.unwrap_or(0.0),
            avg_recommendation: self.avg_recommendation.unwrap_or(0.0),
        });

        let resilience = self.resilience_final.map(|final_score| ResilienceScore {
            final_score,
            initial_score: self.resilience_initial.unwrap_or(0.0),
            conversational_bonus: self.resilience_bonus.unwrap_or(0.0),
            brand_persistence: self.brand_persistence.unwrap_or(0.0),
            sentiment_stability: self.sentiment_stability.unwrap_or(0.0),
            follow_up_active: self.follow_up_active.unwrap_or(false),
        });

        Scan {
            id: self.id,
            project_id: self.project_id,
            status: scan_status_from_string(&self.status),
            total_queries: self.total_queries,
            total_results: self.total_results,
            error_turns: self.error_turns,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            query_cost_usd: self.query_cost_usd,
            evaluation_cost_usd: self.evaluation_cost_usd,
            metrics,
            resilience,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

/// Database representation of one conversation turn
#[derive(Debug, Clone, FromRow)]
pub struct TurnRow {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub query_text: String,
    pub model: String,
    pub level: i16,
    pub follow_up_question: Option<String>,
    pub response_text: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cost_usd: f64,
    pub visibility: Option<f64>,
    pub sentiment: Option<f64>,
    pub ranking: Option<f64>,
    pub recommendation: Option<f64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TurnRow {
    /// Convert database row to domain model. A NULL `visibility` marks an
    /// unevaluated turn; `sentiment` stays independently nullable.
    pub fn into_domain(self) -> Turn {
        let metrics = self.visibility.map(|visibility| TurnMetrics {
            visibility,
            sentiment: self.sentiment,
            ranking: self.ranking.unwrap_or(0.0),
            recommendation: self.recommendation.unwrap_or(0.0),
        });

        Turn {
            id: self.id,
            scan_id: self.scan_id,
            query_text: self.query_text,
            model: self.model,
            level: self.level.clamp(0, u8::MAX as i16) as u8,
            follow_up_question: self.follow_up_question,
            response_text: self.response_text,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            cost_usd: self.cost_usd,
            metrics,
            error: self.error,
            created_at: self.created_at,
        }
    }
}

/// Database representation of a queue record
#[derive(Debug, Clone, FromRow)]
pub struct QueueRow {
    pub scan_id: Uuid,
    pub status: String,
    pub progress_current: i32,
    pub progress_total: i32,
    pub progress_message: String,
    pub updated_at: DateTime<Utc>,
}

impl QueueRow {
    pub fn into_snapshot(self) -> QueueSnapshot {
        QueueSnapshot {
            status: queue_status_from_string(&self.status),
            progress_current: self.progress_current.max(0) as u32,
            progress_total: self.progress_total.max(0) as u32,
            progress_message: self.progress_message,
        }
    }
}

/// Helper to convert ScanStatus to string for database storage
pub fn scan_status_to_string(status: &ScanStatus) -> &'static str {
    match status {
        ScanStatus::Running => "running",
        ScanStatus::Completed => "completed",
        ScanStatus::Failed => "failed",
        ScanStatus::Stopped => "stopped",
    }
}

pub fn scan_status_from_string(status: &str) -> ScanStatus {
    match status {
        "running" => ScanStatus::Running,
        "completed" => ScanStatus::Completed,
        "stopped" => ScanStatus::Stopped,
        _ => ScanStatus::Failed,
    }
}

/// Helper to convert QueueStatus to string for database storage
pub fn queue_status_to_string(status: &QueueStatus) -> &'static str {
    match status {
        QueueStatus::Pending => "pending",
        QueueStatus::Running => "running",
        QueueStatus::Paused => "paused",
        QueueStatus::Cancelled => "cancelled",
    }
}

pub fn queue_status_from_string(status: &str) -> QueueStatus {
    match status {
        "pending" => QueueStatus::Pending,
        "paused" => QueueStatus::Paused,
        "cancelled" => QueueStatus::Cancelled,
        _ => QueueStatus::Running,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_status_round_trips() {
        for status in [
            ScanStatus::Running,
            ScanStatus::Completed,
            ScanStatus::Failed,
            ScanStatus::Stopped,
        ] {
            assert_eq!(
                scan_status_from_string(scan_status_to_string(&status)),
                status
            );
        }
    }

    #[test]
    fn unknown_scan_status_maps_to_failed() {
        assert_eq!(scan_status_from_string("bogus"), ScanStatus::Failed);
    }

    #[test]
    fn null_visibility_means_unevaluated_turn() {
        let row = TurnRow {
            id: Uuid::new_v4(),
            scan_id: Uuid::new_v4(),
            query_text: "q".to_string(),
            model: "m".to_string(),
            level: 0,
            follow_up_question: None,
            response_text: String::new(),
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            visibility: None,
            sentiment: None,
            ranking: None,
            recommendation: None,
            error: Some("offline".to_string()),
            created_at: Utc::now(),
        };
        let turn = row.into_domain();
        assert!(turn.metrics.is_none());
        assert!(turn.failed());
    }
}
