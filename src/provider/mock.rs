// src/provider/mock.rs — Scripted provider for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, ModelProvider, StopReason, TokenUsage};
use crate::infra::errors::DesignError;

/// Replays queued responses in order and records every request it sees.
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<String, DesignError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for r in responses {
            mock.push(r);
        }
        mock
    }

    pub fn push(&self, content: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(content.into()));
    }

    pub fn push_error(&self, error: DesignError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .and_then(|r| r.messages.last().map(|m| m.content.clone()))
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Provider"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, DesignError> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(ChatResponse {
                content,
                usage: TokenUsage {
                    input_tokens: 100,
                    output_tokens: 50,
                },
                stop_reason: StopReason::EndTurn,
            }),
            Some(Err(e)) => Err(e),
            None => Err(DesignError::Provider {
                provider: "mock".into(),
                message: "no scripted response left".into(),
                retriable: false,
            }),
        }
    }
}
