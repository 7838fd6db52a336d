//! Dual-strategy response evaluation
//!
//! Two implementations share one contract: the deterministic lexical scorer
//! and the delegate-AI scorer that falls back to it on any failure. The
//! orchestrator picks the strategy from the project's evaluation method.

use std::sync::Arc;

use crate::model::{EvaluationMethod, ProjectConfig, TurnMetrics};
use crate::service::invoker::ModelInvoker;

pub mod delegate;
pub mod lexical;
pub mod prompts;

pub use delegate::DelegateEvaluator;
pub use lexical::LexicalEvaluator;

/// Token and monetary spend of one evaluation, attributed separately from the
/// primary model call so scan totals can split "answering" from "scoring".
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationCost {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cost_usd: f64,
}

impl EvaluationCost {
    pub fn zero() -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
        }
    }
}

/// Result of evaluating one raw response
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub metrics: TurnMetrics,
    pub cost: EvaluationCost,
}

/// Tagged-variant strategy over the two evaluator implementations
pub enum ResponseEvaluator {
    Lexical(LexicalEvaluator),
    Delegate(DelegateEvaluator),
}

impl ResponseEvaluator {
    /// Build the evaluator a project is configured for. An `ai` project
    /// without an evaluator model degrades to lexical scoring.
    pub fn for_project(project: &ProjectConfig, invoker: Arc<dyn ModelInvoker>) -> Self {
        match (&project.evaluation, &project.evaluator_model) {
            (EvaluationMethod::Ai, Some(target)) => {
                Self::Delegate(DelegateEvaluator::new(invoker, target.clone()))
            }
            (EvaluationMethod::Ai, None) => {
                tracing::warn!(
                    project = %project.project_id,
                    "AI evaluation requested without an evaluator model, using lexical scoring"
                );
                Self::Lexical(LexicalEvaluator::new())
            }
            (EvaluationMethod::Lexical, _) => Self::Lexical(LexicalEvaluator::new()),
        }
    }

    pub async fn evaluate(
        &self,
        response: &str,
        brand_terms: &[String],
        domain: &str,
    ) -> Evaluation {
        match self {
            Self::Lexical(evaluator) => Evaluation {
                metrics: evaluator.evaluate(response, brand_terms, domain),
                cost: EvaluationCost::zero(),
            },
            Self::Delegate(evaluator) => evaluator.evaluate(response, brand_terms, domain).await,
        }
    }
}
