//! Model-invocation capability
//!
//! One trait seam for all outbound AI calls; the production implementation
//! speaks the OpenAI-compatible chat-completions protocol and computes cost
//! from a per-model pricing table.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::model::ModelTarget;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum InvokerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

/// One message of an evolving conversation
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Result of one model invocation
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub text: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cost_usd: f64,
}

/// Black-box "invoke model" capability consumed by the orchestrator and the
/// delegate evaluator. Failures surface as a generic error the caller catches
/// per turn; there is no internal retry.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        target: &ModelTarget,
    ) -> Result<ModelResponse, InvokerError>;
}

/// USD per 1M input/output tokens. Unknown models get a conservative default.
fn model_pricing(model: &str) -> (f64, f64) {
    match model {
        m if m.starts_with("gpt-4o-mini") => (0.15, 0.60),
        m if m.starts_with("gpt-4o") => (2.50, 10.00),
        m if m.starts_with("gpt-4.1-mini") => (0.40, 1.60),
        m if m.starts_with("gpt-4.1-nano") => (0.10, 0.40),
        m if m.starts_with("gpt-4.1") => (2.00, 8.00),
        m if m.starts_with("claude-3-5-haiku") => (0.80, 4.00),
        m if m.starts_with("claude") => (3.00, 15.00),
        m if m.starts_with("gemini-2.0-flash") => (0.10, 0.40),
        m if m.starts_with("gemini") => (1.25, 5.00),
        _ => (1.00, 3.00),
    }
}

/// Estimate the monetary cost of one call from its token usage
pub fn estimate_cost(model: &str, input_tokens: i64, output_tokens: i64) -> f64 {
    let (input_rate, output_rate) = model_pricing(model);
    (input_tokens as f64 * input_rate + output_tokens as f64 * output_rate) / 1_000_000.0
}

/// OpenAI-compatible chat-completions invoker
pub struct OpenAiInvoker {
    client: Client,
}

impl OpenAiInvoker {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for OpenAiInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: i64,
    completion_tokens: i64,
}

#[async_trait]
impl ModelInvoker for OpenAiInvoker {
    async fn invoke(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        target: &ModelTarget,
    ) -> Result<ModelResponse, InvokerError> {
        let base = target.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let url = format!("{}/chat/completions", base.trim_end_matches('/'));

        let mut payload_messages = vec![serde_json::json!({
            "role": "system",
            "content": system_prompt,
        })];
        for message in messages {
            payload_messages.push(serde_json::json!({
                "role": message.role,
                "content": message.content,
            }));
        }

        let start_time = std::time::Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&target.credential)
            .json(&serde_json::json!({
                "model": target.model,
                "messages": payload_messages,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                model = %target.model,
                status = status.as_u16(),
                "Model invocation rejected by provider"
            );
            return Err(InvokerError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await?;

        let text = completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| InvokerError::Malformed("no completion choices".to_string()))?;

        let (input_tokens, output_tokens) = completion
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        let cost_usd = estimate_cost(&target.model, input_tokens, output_tokens);

        tracing::debug!(
            model = %target.model,
            elapsed_ms = start_time.elapsed().as_millis(),
            input_tokens = input_tokens,
            output_tokens = output_tokens,
            cost_usd = cost_usd,
            "Model invocation completed"
        );

        Ok(ModelResponse {
            text,
            input_tokens,
            output_tokens,
            cost_usd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_scales_with_tokens() {
        let cost = estimate_cost("gpt-4o-mini", 1_000_000, 1_000_000);
        assert!((cost - 0.75).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_uses_default_rates() {
        let cost = estimate_cost("mystery-model", 2_000_000, 0);
        assert!((cost - 2.0).abs() < 1e-9);
    }

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(ChatMessage::user("hi").role, "user");
        assert_eq!(ChatMessage::assistant("hello").role, "assistant");
    }
}
