//! Scan orchestration
//!
//! Drives the query x model matrix strictly sequentially, manages follow-up
//! conversation chains, honors cooperative pause/cancel from the queue, and
//! persists per-turn and per-scan records. Provider failures are soft and
//! isolated per turn; only orchestration-level errors fail a scan.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::model::{
    group_chains, ModelTarget, ProjectConfig, Query, Scan, ScanMetrics, ScanStatus, Turn,
};
use crate::service::evaluator::ResponseEvaluator;
use crate::service::invoker::{ChatMessage, ModelInvoker};
use crate::service::resilience;

pub mod error;
pub mod followups;
pub mod queue;

pub use error::{QueueError, ScanError, StoreError};
pub use followups::follow_up_question;
pub use queue::{InMemoryQueue, QueueSnapshot, QueueStatus, QueueStatusProvider};

/// Fixed system instruction for answering scan queries. Deliberately generic;
/// the brand must never leak into the primary conversation.
pub const SCAN_SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer naturally and \
concretely. When a question asks about tools, services or products, name specific ones \
and explain your reasoning briefly.";

const DEFAULT_PAUSE_POLL: Duration = Duration::from_secs(5);

/// Persistence seam for scan and turn records. The exact storage schema is a
/// backend concern; implementations must retain every field of the records.
#[async_trait]
pub trait ScanStore: Send + Sync {
    async fn create_scan(&self, scan: &Scan) -> Result<(), StoreError>;
    async fn update_scan(&self, scan: &Scan) -> Result<(), StoreError>;
    async fn insert_turn(&self, turn: &Turn) -> Result<(), StoreError>;
    async fn get_scan(&self, scan_id: Uuid) -> Result<Scan, StoreError>;
    async fn list_turns(&self, scan_id: Uuid) -> Result<Vec<Turn>, StoreError>;
}

pub struct ScanOrchestrator {
    store: Arc<dyn ScanStore>,
    queue: Arc<dyn QueueStatusProvider>,
    invoker: Arc<dyn ModelInvoker>,
    pause_poll_interval: Duration,
}

impl ScanOrchestrator {
    pub fn new(
        store: Arc<dyn ScanStore>,
        queue: Arc<dyn QueueStatusProvider>,
        invoker: Arc<dyn ModelInvoker>,
    ) -> Self {
        Self {
            store,
            queue,
            invoker,
            pause_poll_interval: DEFAULT_PAUSE_POLL,
        }
    }

    /// Override the pause re-poll cadence
    pub fn with_pause_poll_interval(mut self, interval: Duration) -> Self {
        self.pause_poll_interval = interval;
        self
    }

    /// Run one scan for a project. Creates the scan record, works through the
    /// matrix, and leaves the scan in a terminal state. Previously saved turns
    /// survive any failure for partial analysis.
    pub async fn run_scan(
        &self,
        scan_id: Uuid,
        project: &ProjectConfig,
        models: &[ModelTarget],
    ) -> Result<Scan, ScanError> {
        let mut scan = Scan::new(scan_id, project.project_id, project.queries.len() as i32);
        // Inability to create the scan record is fatal; there is nothing to
        // mark failed yet.
        self.store.create_scan(&scan).await?;

        tracing::info!(
            scan = %scan.id,
            project = %project.project_id,
            queries = project.queries.len(),
            models = models.len(),
            follow_up_depth = project.effective_depth(),
            "Scan started"
        );

        if self.queue.status(scan.id).await? == QueueStatus::Pending {
            self.queue.set_status(scan.id, QueueStatus::Running).await?;
        }

        match self.run_matrix(&mut scan, project, models).await {
            Ok(()) => {
                self.finalize(&mut scan, project).await?;
                tracing::info!(
                    scan = %scan.id,
                    results = scan.total_results,
                    errors = scan.error_turns,
                    cost_usd = scan.total_cost_usd(),
                    "Scan completed"
                );
                Ok(scan)
            }
            Err(ScanError::Cancelled) => {
                scan.status = ScanStatus::Stopped;
                scan.completed_at = Some(Utc::now());
                if let Err(e) = self.store.update_scan(&scan).await {
                    tracing::error!(scan = %scan.id, error = %e, "Failed to record stopped scan");
                }
                tracing::info!(scan = %scan.id, "Scan stopped on cancellation signal");
                Err(ScanError::Cancelled)
            }
            Err(e) => {
                scan.status = ScanStatus::Failed;
                scan.completed_at = Some(Utc::now());
                if let Err(update_err) = self.store.update_scan(&scan).await {
                    tracing::error!(
                        scan = %scan.id,
                        error = %update_err,
                        "Failed to record failed scan"
                    );
                }
                tracing::error!(scan = %scan.id, error = %e, "Scan failed");
                Err(e)
            }
        }
    }

    /// Query-major pass over the cartesian product of queries and models
    async fn run_matrix(
        &self,
        scan: &mut Scan,
        project: &ProjectConfig,
        models: &[ModelTarget],
    ) -> Result<(), ScanError> {
        let evaluator = ResponseEvaluator::for_project(project, Arc::clone(&self.invoker));
        let brand_terms = project.brand_terms();
        let total = (project.queries.len() * models.len()) as u32;
        let mut completed: u32 = 0;

        for query in &project.queries {
            for target in models {
                self.wait_for_clearance(scan.id).await?;

                let label = format!("{} / {}", query.text, target.model);
                if let Err(e) = self
                    .queue
                    .report_progress(scan.id, completed, total, &label)
                    .await
                {
                    tracing::warn!(scan = %scan.id, error = %e, "Progress report failed");
                }

                self.run_chain(scan, project, &evaluator, &brand_terms, query, target)
                    .await?;
                completed += 1;
            }
        }

        if let Err(e) = self
            .queue
            .report_progress(scan.id, total, total, "completed")
            .await
        {
            tracing::warn!(scan = %scan.id, error = %e, "Progress report failed");
        }

        Ok(())
    }

    /// One conversation chain: the initial query plus configured follow-ups.
    /// Invocation failures are recorded as error turns and never abort the
    /// scan; a failed initial turn skips the chain's follow-ups.
    async fn run_chain(
        &self,
        scan: &mut Scan,
        project: &ProjectConfig,
        evaluator: &ResponseEvaluator,
        brand_terms: &[String],
        query: &Query,
        target: &ModelTarget,
    ) -> Result<(), ScanError> {
        let mut messages = vec![ChatMessage::user(query.text.clone())];

        match self.invoker.invoke(SCAN_SYSTEM_PROMPT, &messages, target).await {
            Ok(response) => {
                messages.push(ChatMessage::assistant(response.text.clone()));
                self.record_answered_turn(scan, evaluator, brand_terms, project, query, target, 0, None, response)
                    .await?;
            }
            Err(e) => {
                tracing::warn!(
                    scan = %scan.id,
                    model = %target.model,
                    level = 0,
                    error = %e,
                    "Model invocation failed, recording error turn"
                );
                self.record_error_turn(scan, query, target, 0, None, &e.to_string())
                    .await?;
                return Ok(());
            }
        }

        for level in 1..=project.effective_depth() {
            let question = follow_up_question(query.category, level);
            messages.push(ChatMessage::user(question));

            match self.invoker.invoke(SCAN_SYSTEM_PROMPT, &messages, target).await {
                Ok(response) => {
                    messages.push(ChatMessage::assistant(response.text.clone()));
                    self.record_answered_turn(
                        scan,
                        evaluator,
                        brand_terms,
                        project,
                        query,
                        target,
                        level,
                        Some(question.to_string()),
                        response,
                    )
                    .await?;
                }
                Err(e) => {
                    tracing::warn!(
                        scan = %scan.id,
                        model = %target.model,
                        level = level,
                        error = %e,
                        "Follow-up invocation failed, recording error turn"
                    );
                    self.record_error_turn(
                        scan,
                        query,
                        target,
                        level,
                        Some(question.to_string()),
                        &e.to_string(),
                    )
                    .await?;
                }
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_answered_turn(
        &self,
        scan: &mut Scan,
        evaluator: &ResponseEvaluator,
        brand_terms: &[String],
        project: &ProjectConfig,
        query: &Query,
        target: &ModelTarget,
        level: u8,
        follow_up_question: Option<String>,
        response: crate::service::invoker::ModelResponse,
    ) -> Result<(), ScanError> {
        let evaluation = evaluator
            .evaluate(&response.text, brand_terms, &project.domain)
            .await;

        let turn = Turn {
            id: Uuid::new_v4(),
            scan_id: scan.id,
            query_text: query.text.clone(),
            model: target.model.clone(),
            level,
            follow_up_question,
            response_text: response.text,
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
            cost_usd: response.cost_usd,
            metrics: Some(evaluation.metrics),
            error: None,
            created_at: Utc::now(),
        };
        self.store.insert_turn(&turn).await?;

        scan.total_results += 1;
        scan.input_tokens += response.input_tokens + evaluation.cost.input_tokens;
        scan.output_tokens += response.output_tokens + evaluation.cost.output_tokens;
        scan.query_cost_usd += response.cost_usd;
        scan.evaluation_cost_usd += evaluation.cost.cost_usd;
        Ok(())
    }

    async fn record_error_turn(
        &self,
        scan: &mut Scan,
        query: &Query,
        target: &ModelTarget,
        level: u8,
        follow_up_question: Option<String>,
        error: &str,
    ) -> Result<(), ScanError> {
        let turn = Turn {
            id: Uuid::new_v4(),
            scan_id: scan.id,
            query_text: query.text.clone(),
            model: target.model.clone(),
            level,
            follow_up_question,
            response_text: String::new(),
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            metrics: None,
            error: Some(error.to_string()),
            created_at: Utc::now(),
        };
        self.store.insert_turn(&turn).await?;
        scan.error_turns += 1;
        Ok(())
    }

    /// Cooperative pause/cancel point, entered before each query x model pair.
    /// Blocks on `paused` by re-polling on a fixed interval and re-checks for
    /// cancellation on every wake.
    async fn wait_for_clearance(&self, scan_id: Uuid) -> Result<(), ScanError> {
        loop {
            match self.queue.status(scan_id).await? {
                QueueStatus::Cancelled => return Err(ScanError::Cancelled),
                QueueStatus::Paused => {
                    tracing::debug!(scan = %scan_id, "Scan paused, waiting for resume");
                    tokio::time::sleep(self.pause_poll_interval).await;
                }
                QueueStatus::Pending | QueueStatus::Running => return Ok(()),
            }
        }
    }

    /// Reduce every chain through the resilience scorer, aggregate scan-level
    /// metrics, and transition the scan to completed.
    async fn finalize(&self, scan: &mut Scan, project: &ProjectConfig) -> Result<(), ScanError> {
        let turns = self.store.list_turns(scan.id).await?;
        let follow_ups_enabled = project.effective_depth() > 0;

        scan.metrics = scan_metrics(&turns);

        let chain_scores: Vec<_> = group_chains(turns)
            .iter()
            .filter_map(|chain| resilience::score_chain(chain, follow_ups_enabled))
            .collect();
        scan.resilience = resilience::aggregate(&chain_scores, follow_ups_enabled);

        scan.status = ScanStatus::Completed;
        scan.completed_at = Some(Utc::now());
        self.store.update_scan(scan).await?;
        Ok(())
    }
}

/// Straight averages over all evaluated turns
fn scan_metrics(turns: &[Turn]) -> Option<ScanMetrics> {
    let scored: Vec<_> = turns.iter().filter_map(|t| t.metrics.as_ref()).collect();
    if scored.is_empty() {
        return None;
    }
    let n = scored.len() as f64;
    let sentiments: Vec<f64> = scored.iter().filter_map(|m| m.sentiment).collect();

    Some(ScanMetrics {
        avg_visibility: scored.iter().map(|m| m.visibility).sum::<f64>() / n,
        avg_sentiment: if sentiments.is_empty() {
            None
        } else {
            Some(sentiments.iter().sum::<f64>() / sentiments.len() as f64)
        },
        avg_ranking: scored.iter().map(|m| m.ranking).sum::<f64>() / n,
        avg_recommendation: scored.iter().map(|m| m.recommendation).sum::<f64>() / n,
    })
}
