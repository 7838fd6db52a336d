//! Delegate-AI response evaluator
//!
//! Sends the response text to a secondary model with a scoring prompt and
//! parses its structured reply. Any failure falls back silently to the
//! lexical evaluator; evaluation must never abort a scan.

use std::sync::Arc;

use crate::model::{ExtractedScores, ModelTarget, TurnMetrics};
use crate::service::evaluator::lexical::LexicalEvaluator;
use crate::service::evaluator::prompts::{build_scoring_prompt, SCORING_SYSTEM_PROMPT};
use crate::service::evaluator::{Evaluation, EvaluationCost};
use crate::service::invoker::{ChatMessage, InvokerError, ModelInvoker};

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Delegate invocation failed: {0}")]
    Invoke(#[from] InvokerError),

    #[error("Delegate reply was not valid scoring JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

pub struct DelegateEvaluator {
    invoker: Arc<dyn ModelInvoker>,
    target: ModelTarget,
    fallback: LexicalEvaluator,
}

impl DelegateEvaluator {
    pub fn new(invoker: Arc<dyn ModelInvoker>, target: ModelTarget) -> Self {
        Self {
            invoker,
            target,
            fallback: LexicalEvaluator::new(),
        }
    }

    /// Score one response. The delegate call's own token counts and cost are
    /// returned tagged separately from the primary model call's cost; a
    /// fallback evaluation reports zero additional cost.
    pub async fn evaluate(
        &self,
        response: &str,
        brand_terms: &[String],
        domain: &str,
    ) -> Evaluation {
        match self.try_delegate(response, brand_terms, domain).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                tracing::warn!(
                    model = %self.target.model,
                    error = %e,
                    "Delegate scoring failed, falling back to lexical evaluation"
                );
                Evaluation {
                    metrics: self.fallback.evaluate(response, brand_terms, domain),
                    cost: EvaluationCost::zero(),
                }
            }
        }
    }

    async fn try_delegate(
        &self,
        response: &str,
        brand_terms: &[String],
        domain: &str,
    ) -> Result<Evaluation, EvaluationError> {
        let prompt = build_scoring_prompt(brand_terms, domain, response);

        let reply = self
            .invoker
            .invoke(
                SCORING_SYSTEM_PROMPT,
                &[ChatMessage::user(prompt)],
                &self.target,
            )
            .await?;

        let extracted: ExtractedScores = serde_json::from_str(strip_code_fences(&reply.text))?;
        let metrics = normalize_scores(extracted);

        tracing::debug!(
            model = %self.target.model,
            visibility = metrics.visibility,
            recommendation = metrics.recommendation,
            cost_usd = reply.cost_usd,
            "Delegate scoring completed"
        );

        Ok(Evaluation {
            metrics,
            cost: EvaluationCost {
                input_tokens: reply.input_tokens,
                output_tokens: reply.output_tokens,
                cost_usd: reply.cost_usd,
            },
        })
    }
}

/// Remove an optional markdown code fence around the JSON payload
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the fence's language tag line, then the closing fence
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Clamp every field to [0, 100] and gate sentiment on a mention, regardless
/// of what the delegate returned.
fn normalize_scores(extracted: ExtractedScores) -> TurnMetrics {
    let visibility = extracted.visibility.clamp(0.0, 100.0);
    let sentiment = if visibility > 0.0 {
        Some(extracted.sentiment.clamp(0.0, 100.0))
    } else {
        None
    };
    TurnMetrics {
        visibility,
        sentiment,
        ranking: extracted.ranking.clamp(0.0, 100.0),
        recommendation: extracted.recommendation.clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::invoker::ModelResponse;
    use async_trait::async_trait;

    struct CannedInvoker {
        reply: Result<String, ()>,
    }

    #[async_trait]
    impl ModelInvoker for CannedInvoker {
        async fn invoke(
            &self,
            _system_prompt: &str,
            _messages: &[ChatMessage],
            _target: &ModelTarget,
        ) -> Result<ModelResponse, InvokerError> {
            match &self.reply {
                Ok(text) => Ok(ModelResponse {
                    text: text.clone(),
                    input_tokens: 120,
                    output_tokens: 30,
                    cost_usd: 0.0005,
                }),
                Err(()) => Err(InvokerError::Malformed("boom".to_string())),
            }
        }
    }

    fn target() -> ModelTarget {
        ModelTarget {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            credential: "key".to_string(),
            base_url: None,
        }
    }

    fn evaluator(reply: Result<String, ()>) -> DelegateEvaluator {
        DelegateEvaluator::new(Arc::new(CannedInvoker { reply }), target())
    }

    #[test]
    fn strips_fenced_json() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"a\": 1}");
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn normalization_clamps_and_gates_sentiment() {
        let metrics = normalize_scores(ExtractedScores {
            visibility: 150.0,
            sentiment: -20.0,
            ranking: 101.0,
            recommendation: 99.5,
        });
        assert_eq!(metrics.visibility, 100.0);
        assert_eq!(metrics.sentiment, Some(0.0));
        assert_eq!(metrics.ranking, 100.0);

        let gated = normalize_scores(ExtractedScores {
            visibility: 0.0,
            sentiment: 80.0,
            ranking: 0.0,
            recommendation: 0.0,
        });
        assert_eq!(gated.sentiment, None);
    }

    #[tokio::test]
    async fn parses_delegate_reply_with_cost() {
        let reply = r#"```json
{"visibility": 100, "sentiment": 75, "ranking": 80, "recommendation": 82}
```"#;
        let evaluation = evaluator(Ok(reply.to_string()))
            .evaluate("Acme is great", &["Acme".to_string()], "acme.com")
            .await;
        assert_eq!(evaluation.metrics.visibility, 100.0);
        assert_eq!(evaluation.metrics.sentiment, Some(75.0));
        assert_eq!(evaluation.cost.input_tokens, 120);
        assert!(evaluation.cost.cost_usd > 0.0);
    }

    #[tokio::test]
    async fn falls_back_to_lexical_on_invoke_failure() {
        let evaluation = evaluator(Err(()))
            .evaluate("Acme is great.", &["Acme".to_string()], "acme.com")
            .await;
        // Lexical result, zero evaluation cost
        assert_eq!(evaluation.metrics.visibility, 50.0);
        assert_eq!(evaluation.metrics.sentiment, Some(60.0));
        assert_eq!(evaluation.cost.cost_usd, 0.0);
        assert_eq!(evaluation.cost.input_tokens, 0);
    }

    #[tokio::test]
    async fn falls_back_on_non_json_reply() {
        let evaluation = evaluator(Ok("I would rate this highly!".to_string()))
            .evaluate("Nothing about the brand.", &["Acme".to_string()], "acme.com")
            .await;
        assert_eq!(evaluation.metrics.visibility, 0.0);
        assert_eq!(evaluation.metrics.sentiment, None);
        assert_eq!(evaluation.cost.cost_usd, 0.0);
    }

    #[tokio::test]
    async fn falls_back_on_missing_field() {
        let evaluation = evaluator(Ok(r#"{"visibility": 50, "sentiment": 60}"#.to_string()))
            .evaluate("Acme is great.", &["Acme".to_string()], "acme.com")
            .await;
        // Missing ranking/recommendation is a parse failure, lexical takes over
        assert_eq!(evaluation.metrics.visibility, 50.0);
        assert_eq!(evaluation.cost.cost_usd, 0.0);
    }
}
