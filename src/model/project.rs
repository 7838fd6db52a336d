//! Project-level scan configuration: brand identity, queries and model targets

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Category of a test query, selects which follow-up questions apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    Informational,
    Transactional,
    Comparison,
}

/// A fixed natural-language test prompt belonging to a project
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Query {
    pub text: String,
    pub category: QueryCategory,
}

/// Which evaluator scores raw model responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMethod {
    /// Delegate-AI scoring with silent lexical fallback
    Ai,
    /// Deterministic rule-based scoring, zero cost
    Lexical,
}

/// One model the orchestrator must invoke. Supplied per scan run, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelTarget {
    pub provider: String,
    pub model: String,
    /// API key for the provider; never serialized back out
    #[serde(skip_serializing)]
    pub credential: String,
    /// OpenAI-compatible endpoint base URL; provider default when absent
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Everything the orchestrator needs to know about a project for one run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectConfig {
    pub project_id: Uuid,
    pub brand_name: String,
    /// Alternative spellings of the brand, matched case-insensitively
    #[serde(default)]
    pub brand_variations: Vec<String>,
    pub domain: String,
    pub evaluation: EvaluationMethod,
    #[serde(default)]
    pub follow_up_enabled: bool,
    /// Follow-up depth 0-3; levels beyond 3 are never asked
    #[serde(default)]
    pub follow_up_depth: u8,
    pub queries: Vec<Query>,
    /// Model used by the delegate-AI evaluator; required when evaluation is `ai`
    #[serde(default)]
    pub evaluator_model: Option<ModelTarget>,
}

impl ProjectConfig {
    /// Brand name plus variations, deduplicated, for mention detection
    pub fn brand_terms(&self) -> Vec<String> {
        let mut terms = vec![self.brand_name.clone()];
        for variation in &self.brand_variations {
            if !variation.is_empty()
                && !terms.iter().any(|t| t.eq_ignore_ascii_case(variation))
            {
                terms.push(variation.clone());
            }
        }
        terms
    }

    /// Effective follow-up depth, capped at 3 and zeroed when disabled
    pub fn effective_depth(&self) -> u8 {
        if self.follow_up_enabled {
            self.follow_up_depth.min(3)
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(enabled: bool, depth: u8) -> ProjectConfig {
        ProjectConfig {
            project_id: Uuid::new_v4(),
            brand_name: "Acme".to_string(),
            brand_variations: vec!["acme".to_string(), "Acme Inc".to_string()],
            domain: "acme.com".to_string(),
            evaluation: EvaluationMethod::Lexical,
            follow_up_enabled: enabled,
            follow_up_depth: depth,
            queries: vec![],
            evaluator_model: None,
        }
    }

    #[test]
    fn brand_terms_deduplicates_case_insensitively() {
        let terms = project(false, 0).brand_terms();
        assert_eq!(terms, vec!["Acme".to_string(), "Acme Inc".to_string()]);
    }

    #[test]
    fn effective_depth_caps_and_zeroes() {
        assert_eq!(project(true, 5).effective_depth(), 3);
        assert_eq!(project(true, 2).effective_depth(), 2);
        assert_eq!(project(false, 2).effective_depth(), 0);
    }
}
