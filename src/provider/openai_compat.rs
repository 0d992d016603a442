// src/provider/openai_compat.rs — Generic OpenAI-compatible provider
//
// Used by: Groq, OpenAI, OpenRouter, Together, DeepSeek, and custom endpoints.

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{ChatRequest, ChatResponse, ModelProvider, StopReason, TokenUsage};
use crate::infra::errors::DesignError;

/// Request timeout for a single chat completion.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

/// Provider for any OpenAI-compatible API endpoint.
pub struct OpenAICompatProvider {
    id_str: String,
    name_str: String,
    api_key: String,
    base_url: String,
    default_model: String,
    client: reqwest::Client,
}

impl OpenAICompatProvider {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        api_key: String,
        base_url: String,
        default_model: String,
    ) -> Self {
        Self {
            id_str: id.into(),
            name_str: name.into(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn error(&self, message: impl Into<String>, retriable: bool) -> DesignError {
        DesignError::Provider {
            provider: self.id_str.clone(),
            message: message.into(),
            retriable,
        }
    }

    /// Map a non-success HTTP status to a provider error.
    fn status_error(&self, status: StatusCode, retry_after: Option<u64>, body: String) -> DesignError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return DesignError::RateLimited {
                provider: self.id_str.clone(),
                retry_after_ms: retry_after.map(|s| s * 1000).unwrap_or(0),
            };
        }
        self.error(format!("HTTP {status}: {body}"), status.is_server_error())
    }
}

/// Build the JSON body for `POST /chat/completions`.
pub fn build_body(request: &ChatRequest) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = request
        .messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        })
        .collect();

    let mut body = serde_json::json!({
        "model": request.model,
        "messages": messages,
    });
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = serde_json::json!(max_tokens);
    }
    if let Some(temp) = request.temperature {
        body["temperature"] = serde_json::json!(temp);
    }
    body
}

/// Pull content, usage, and stop reason out of a chat completion response.
pub fn parse_completion(resp: &serde_json::Value) -> ChatResponse {
    let content = resp["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string();

    let usage = TokenUsage {
        input_tokens: token_count(&resp["usage"]["prompt_tokens"]),
        output_tokens: token_count(&resp["usage"]["completion_tokens"]),
    };

    ChatResponse {
        content,
        usage,
        stop_reason: StopReason::from_finish_reason(resp["choices"][0]["finish_reason"].as_str()),
    }
}

/// A usage counter as `u32`, saturating when the endpoint reports more.
fn token_count(value: &serde_json::Value) -> u32 {
    value
        .as_u64()
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

#[async_trait]
impl ModelProvider for OpenAICompatProvider {
    fn id(&self) -> &str {
        &self.id_str
    }

    fn name(&self) -> &str {
        &self.name_str
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, DesignError> {
        let body = build_body(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(
                "User-Agent",
                format!("designloop/{}", env!("CARGO_PKG_VERSION")),
            )
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.error(e.to_string(), e.is_timeout() || e.is_connect()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_body = response.text().await.unwrap_or_default();
            return Err(self.status_error(status, retry_after, error_body));
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| self.error(e.to_string(), false))?;

        let parsed = parse_completion(&resp);
        tracing::debug!(
            provider = %self.id_str,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "chat completion received",
        );
        Ok(parsed)
    }
}
