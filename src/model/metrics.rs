//! Scan, turn and metrics domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Normalized per-turn scores, all in [0, 100]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TurnMetrics {
    /// 50 for a brand mention + 50 for a domain mention, additive
    pub visibility: f64,
    /// 50 = neutral. None when neither brand nor domain is mentioned;
    /// sentiment is only meaningful in the context of a mention.
    pub sentiment: Option<f64>,
    /// List-position score, discretized to {100, 80, 60, 40, 20, 0}
    pub ranking: f64,
    /// Weighted composite of the other three; 0 whenever the brand is absent
    pub recommendation: f64,
}

impl TurnMetrics {
    pub fn zero() -> Self {
        Self {
            visibility: 0.0,
            sentiment: None,
            ranking: 0.0,
            recommendation: 0.0,
        }
    }
}

/// One request/response exchange with a model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Turn {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub query_text: String,
    pub model: String,
    /// 0 = initial query, 1-3 = follow-up depth
    pub level: u8,
    /// The canned follow-up question asked; None at level 0
    pub follow_up_question: Option<String>,
    pub response_text: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cost_usd: f64,
    pub metrics: Option<TurnMetrics>,
    /// Invocation error message when the provider call failed
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Adjusted score for one query x model conversation chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResilienceScore {
    pub final_score: f64,
    /// The level-0 recommendation
    pub initial_score: f64,
    /// Signed adjustment contributed by follow-up turns
    pub conversational_bonus: f64,
    /// Percentage of levels in which the brand or domain was visible
    pub brand_persistence: f64,
    /// 100 minus the mean deviation of in-context sentiment across levels
    pub sentiment_stability: f64,
    pub follow_up_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Running,
    Completed,
    Failed,
    Stopped,
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScanStatus::Running)
    }
}

/// Scan-level averages across all scored turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScanMetrics {
    pub avg_visibility: f64,
    /// Mean over in-context sentiment values only; None when no turn had one
    pub avg_sentiment: Option<f64>,
    pub avg_ranking: f64,
    pub avg_recommendation: f64,
}

/// The aggregate of all chains produced by one orchestrator run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Scan {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: ScanStatus,
    pub total_queries: i32,
    /// Successfully answered and evaluated turns
    pub total_results: i32,
    /// Turns recorded for failed provider invocations
    pub error_turns: i32,
    pub input_tokens: i64,
    pub output_tokens: i64,
    /// Spend on answering the queries themselves
    pub query_cost_usd: f64,
    /// Spend on delegate-AI scoring of the answers
    pub evaluation_cost_usd: f64,
    pub metrics: Option<ScanMetrics>,
    pub resilience: Option<ResilienceScore>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Scan {
    pub fn new(id: Uuid, project_id: Uuid, total_queries: i32) -> Self {
        Self {
            id,
            project_id,
            status: ScanStatus::Running,
            total_queries,
            total_results: 0,
            error_turns: 0,
            input_tokens: 0,
            output_tokens: 0,
            query_cost_usd: 0.0,
            evaluation_cost_usd: 0.0,
            metrics: None,
            resilience: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn total_cost_usd(&self) -> f64 {
        self.query_cost_usd + self.evaluation_cost_usd
    }
}

/// Group a scan's turns into conversation chains keyed by (query, model),
/// each chain sorted by follow-up level. Chains are an arena keyed by the
/// pair, not a pointer-linked list.
pub fn group_chains(turns: Vec<Turn>) -> Vec<Vec<Turn>> {
    let mut chains: BTreeMap<(String, String), Vec<Turn>> = BTreeMap::new();
    for turn in turns {
        chains
            .entry((turn.query_text.clone(), turn.model.clone()))
            .or_default()
            .push(turn);
    }
    chains
        .into_values()
        .map(|mut chain| {
            chain.sort_by_key(|t| t.level);
            chain
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(query: &str, model: &str, level: u8) -> Turn {
        Turn {
            id: Uuid::new_v4(),
            scan_id: Uuid::new_v4(),
            query_text: query.to_string(),
            model: model.to_string(),
            level,
            follow_up_question: None,
            response_text: String::new(),
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            metrics: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn group_chains_sorts_by_level_within_pair() {
        let turns = vec![
            turn("q1", "gpt-4o", 2),
            turn("q1", "gpt-4o", 0),
            turn("q2", "gpt-4o", 0),
            turn("q1", "gpt-4o", 1),
            turn("q1", "claude", 0),
        ];

        let chains = group_chains(turns);
        assert_eq!(chains.len(), 3);

        let long_chain = chains
            .iter()
            .find(|c| c.len() == 3)
            .expect("q1 x gpt-4o chain");
        let levels: Vec<u8> = long_chain.iter().map(|t| t.level).collect();
        assert_eq!(levels, vec![0, 1, 2]);
    }

    #[test]
    fn scan_status_terminality() {
        assert!(!ScanStatus::Running.is_terminal());
        assert!(ScanStatus::Completed.is_terminal());
        assert!(ScanStatus::Failed.is_terminal());
        assert!(ScanStatus::Stopped.is_terminal());
    }
}
