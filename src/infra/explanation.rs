//! Mismatch explanations via an OpenAI-compatible chat completion endpoint.
//!
//! The lookup is advisory. Any fault (no key, network error, timeout, bad
//! payload) resolves to a fixed fallback, and the reconciliation status in the
//! response is always the one the caller sent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ExplainRequest, ExplainResponse};

use super::ExplanationProvider;

pub const DEFAULT_EXPLAIN_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_EXPLAIN_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EXPLAIN_TIMEOUT: Duration = Duration::from_millis(5000);

const SYSTEM_PROMPT: &str = r#"You are a read-only reconciliation analyst for a GST compliance system.
Explain the mismatch between a customer invoice and the GSTR-2B record using only the data provided.

RULES:
1. Do not change the reconciliation status.
2. Do not perform new calculations or invent numbers.
3. Do not give tax filing or legal advice.
4. Output valid JSON only.

OUTPUT FORMAT:
{
  "explanation": "Plain English explanation",
  "root_cause": "Category (e.g. Data Entry Error, Timing Issue, Vendor Non-Compliance)",
  "suggested_action": "Action (e.g. Contact Vendor, Verify Date, Accept Mismatch)"
}"#;

/// The fixed payload returned whenever no live explanation is available.
pub fn fallback_response(request: &ExplainRequest) -> ExplainResponse {
    ExplainResponse {
        explanation: "Automated explanation unavailable. Please review manually.".to_string(),
        root_cause: "System Limitation".to_string(),
        suggested_action: "Manual Review".to_string(),
        original_status: request.status,
    }
}

/// Always answers with the fallback payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackExplainer;

#[async_trait]
impl ExplanationProvider for FallbackExplainer {
    async fn explain(&self, request: &ExplainRequest) -> ExplainResponse {
        fallback_response(request)
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

/// Live explainer settings
#[derive(Debug, Clone)]
pub struct ExplainerConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl ExplainerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_EXPLAIN_API_URL.to_string(),
            model: DEFAULT_EXPLAIN_MODEL.to_string(),
            timeout: DEFAULT_EXPLAIN_TIMEOUT,
        }
    }
}

#[derive(Error, Debug)]
enum ExplainError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct ExplanationPayload {
    explanation: Option<String>,
    root_cause: Option<String>,
    suggested_action: Option<String>,
}

/// Calls the configured chat completion endpoint.
pub struct LiveExplainer {
    http: reqwest::Client,
    config: ExplainerConfig,
}

impl LiveExplainer {
    pub fn new(config: ExplainerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn call(&self, request: &ExplainRequest) -> Result<ExplainResponse, ExplainError> {
        let user_prompt = build_user_prompt(request);
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExplainError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ExplainError::InvalidResponse("no choices in response".to_string()))?;

        let payload: ExplanationPayload = serde_json::from_str(&content)
            .map_err(|e| ExplainError::InvalidResponse(e.to_string()))?;

        Ok(ExplainResponse {
            explanation: payload
                .explanation
                .unwrap_or_else(|| "No explanation provided.".to_string()),
            root_cause: payload.root_cause.unwrap_or_else(|| "Unknown".to_string()),
            suggested_action: payload
                .suggested_action
                .unwrap_or_else(|| "Review".to_string()),
            original_status: request.status,
        })
    }
}

#[async_trait]
impl ExplanationProvider for LiveExplainer {
    async fn explain(&self, request: &ExplainRequest) -> ExplainResponse {
        let outcome = match tokio::time::timeout(self.config.timeout, self.call(request)).await {
            Ok(result) => result,
            Err(_) => Err(ExplainError::Timeout(self.config.timeout)),
        };

        match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    invoice_number = %request.invoice_number,
                    error = %e,
                    "Explanation lookup failed, using fallback"
                );
                fallback_response(request)
            }
        }
    }

    fn name(&self) -> &'static str {
        "live"
    }
}

fn build_user_prompt(request: &ExplainRequest) -> String {
    let diffs = serde_json::Value::Object(request.factual_diffs.clone());
    format!(
        "Status: {}\nInvoice: {} (GSTIN: {})\nDifferences: {}\n\nExplain this situation.",
        request.status, request.invoice_number, request.gstin, diffs
    )
}

/// Live explainer when a key is configured, otherwise the fallback.
pub fn explainer_from_config(config: Option<ExplainerConfig>) -> Arc<dyn ExplanationProvider> {
    match config {
        Some(config) => Arc::new(LiveExplainer::new(config)),
        None => Arc::new(FallbackExplainer),
    }
}
