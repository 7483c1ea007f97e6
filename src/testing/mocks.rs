//! Mock implementations for testing
//!
//! Provides a scripted LlmProvider so the API agent tool can be exercised
//! without a real language model.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, TokenUsage,
    ToolCall,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Mock LLM provider returning scripted responses in order
///
/// Once the script is exhausted the last response is repeated, which makes
/// "the model never stops calling functions" easy to simulate.
#[derive(Debug, Default)]
pub struct MockLlmProvider {
    pub responses: Vec<CompletionResponse>,
    pub should_fail: bool,
    call_count: Arc<Mutex<usize>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses,
            ..Default::default()
        }
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Final answer without function calls
    pub fn text_response(content: &str) -> CompletionResponse {
        CompletionResponse {
            content: Some(content.to_string()),
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            },
            finish_reason: FinishReason::Stop,
            tool_calls: None,
        }
    }

    /// Response requesting a single function call
    pub fn tool_call_response(name: &str, arguments: Value) -> CompletionResponse {
        CompletionResponse {
            content: None,
            model: "mock-model".to_string(),
            usage: TokenUsage::default(),
            finish_reason: FinishReason::ToolCalls,
            tool_calls: Some(vec![ToolCall {
                id: format!("call_{name}"),
                name: name.to_string(),
                arguments,
            }]),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.lock().map(|count| *count).unwrap_or(0)
    }

    /// Requests received so far, in order
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if self.should_fail {
            return Err(LlmError::ApiError("Mock LLM failure".to_string()));
        }

        let index = {
            let mut count = self
                .call_count
                .lock()
                .map_err(|e| LlmError::ApiError(e.to_string()))?;
            let index = *count;
            *count += 1;
            index
        };
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        self.responses
            .get(index)
            .or_else(|| self.responses.last())
            .cloned()
            .ok_or_else(|| LlmError::InvalidResponse("No scripted responses".to_string()))
    }
}
