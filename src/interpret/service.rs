//! HTTP client for the semantic-interpretation service.
//!
//! Speaks an OpenAI-compatible chat-completions endpoint. The primary mode
//! uses the stronger model with mild temperature; the conservative mode
//! uses the stricter model at temperature zero.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{InterpretError, InterpretationService, ResolutionMode, SafeNode};

/// Tracing target for interpretation-service calls.
pub const TRACING_TARGET: &str = "flowc::interpret";

#[derive(Debug, Clone)]
pub struct ModelProfile {
    pub model: String,
    pub temperature: f64,
}

#[derive(Debug, Clone)]
pub struct HttpInterpreterConfig {
    /// Endpoint root, e.g. `https://api.groq.com/openai/v1`.
    pub base_url: String,
    pub api_key: String,
    pub primary: ModelProfile,
    pub fallback: ModelProfile,
}

impl HttpInterpreterConfig {
    /// Read endpoint and model settings from `FLOWC_*` environment
    /// variables. Only the API key is mandatory.
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("FLOWC_API_KEY")
            .map_err(|_| "FLOWC_API_KEY is not set".to_string())?;
        Ok(HttpInterpreterConfig {
            base_url: std::env::var("FLOWC_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
            api_key,
            primary: ModelProfile {
                model: std::env::var("FLOWC_PRIMARY_MODEL")
                    .unwrap_or_else(|_| "llama3-70b-8192".to_string()),
                temperature: 0.1,
            },
            fallback: ModelProfile {
                model: std::env::var("FLOWC_FALLBACK_MODEL")
                    .unwrap_or_else(|_| "llama3-8b-8192".to_string()),
                temperature: 0.0,
            },
        })
    }
}

pub struct HttpInterpreter {
    http: reqwest::Client,
    config: HttpInterpreterConfig,
}

impl HttpInterpreter {
    pub fn new(config: HttpInterpreterConfig) -> Result<Self, InterpretError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| InterpretError::Transport(e.to_string()))?;
        Ok(HttpInterpreter { http, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Prompt instructing the model to answer with exactly one JSON object of
/// the required shape.
fn build_prompt(safe_node: &Value) -> String {
    let spec = serde_json::to_string_pretty(safe_node).unwrap_or_default();
    format!(
        r#"You are an expert automation engineer converting workflow nodes to executable configurations.
Given this node specification, return ONLY the resolved configuration in JSON format.

Required response format:
{{
  "resolved_config": {{}}
}}

Important rules:
1. Respond with exactly one JSON object that matches the required format
2. Do not include any explanations, markdown, or extra text
3. Ensure all JSON strings are properly escaped
4. If a value looks like a template expression (starts with '={{'), preserve it exactly
5. For empty values, use null or empty strings as appropriate
6. Maintain all keys from the original config
7. Only modify values that need resolution

Node specification:
{spec}"#
    )
}

#[async_trait]
impl InterpretationService for HttpInterpreter {
    async fn interpret(
        &self,
        node: &SafeNode,
        mode: ResolutionMode,
    ) -> Result<Value, InterpretError> {
        let profile = match mode {
            ResolutionMode::Primary => &self.config.primary,
            ResolutionMode::Conservative => &self.config.fallback,
        };
        let projection =
            serde_json::to_value(node).map_err(|e| InterpretError::Transport(e.to_string()))?;

        debug!(target: TRACING_TARGET, node = %node.id, model = %profile.model, "interpreting node");

        let body = json!({
            "model": profile.model,
            "temperature": profile.temperature,
            "response_format": {"type": "json_object"},
            "messages": [{"role": "user", "content": build_prompt(&projection)}],
        });

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InterpretError::Timeout
                } else {
                    InterpretError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(InterpretError::BadRequest(format!("{status}: {detail}")));
        }
        if !status.is_success() {
            return Err(InterpretError::Transport(format!("unexpected status {status}")));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| InterpretError::Transport(format!("unreadable response: {e}")))?;
        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| InterpretError::InvalidJson("no completion choices".to_string()))?;

        serde_json::from_str(content)
            .map_err(|e| InterpretError::InvalidJson(format!("{e}: {content}")))
    }
}
