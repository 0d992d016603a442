// src/core/backend.rs — Prompt-in, text-out calls shared by every step

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::types::Step;
use crate::infra::errors::DesignError;
use crate::provider::roles::ModelRoles;
use crate::provider::{ChatRequest, Message, ModelProvider, TokenUsage};
use crate::util::truncate_str;

/// The narrow interface steps use to talk to the text-generation backend.
///
/// Every call carries exactly two turns: the step's role priming and the
/// task prompt. Token usage across all calls is metered here.
pub struct StepClient {
    provider: Arc<dyn ModelProvider>,
    roles: ModelRoles,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    input_tokens: AtomicU32,
    output_tokens: AtomicU32,
    calls: AtomicU32,
}

impl StepClient {
    pub fn new(provider: Arc<dyn ModelProvider>, roles: ModelRoles) -> Self {
        Self {
            provider,
            roles,
            temperature: None,
            max_tokens: None,
            input_tokens: AtomicU32::new(0),
            output_tokens: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    /// Use the provider's default model for every step.
    pub fn with_default_model(provider: Arc<dyn ModelProvider>) -> Self {
        let roles = ModelRoles::from_single(provider.default_model());
        Self::new(provider, roles)
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn model_for(&self, step: Step) -> &str {
        match step {
            Step::Generate => &self.roles.generator,
            Step::Evaluate => &self.roles.evaluator,
            Step::Refine => &self.roles.refiner,
            Step::Select => &self.roles.selector,
        }
    }

    /// Send one request and return the raw response text.
    pub async fn ask(&self, step: Step, system: &str, prompt: String) -> Result<String, DesignError> {
        let model = self.model_for(step).to_string();
        tracing::debug!(
            %step,
            model = %model,
            prompt_chars = prompt.len(),
            "Sending request",
        );

        let request = ChatRequest {
            model,
            messages: vec![Message::system(system), Message::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let response = self.provider.chat(request).await?;

        self.calls.fetch_add(1, Ordering::Relaxed);
        self.input_tokens
            .fetch_add(response.usage.input_tokens, Ordering::Relaxed);
        self.output_tokens
            .fetch_add(response.usage.output_tokens, Ordering::Relaxed);

        tracing::debug!(
            %step,
            response_chars = response.content.len(),
            preview = %truncate_str(&response.content, 200),
            "Received response",
        );
        Ok(response.content)
    }

    /// Usage accumulated across every successful call so far.
    pub fn usage(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.output_tokens.load(Ordering::Relaxed),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}
