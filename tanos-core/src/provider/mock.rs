//! Deterministic offline provider.
//!
//! Answers every request with a fixed template built from the request and
//! keeps a log of what it was sent.

use super::*;
use crate::error::Error;
use std::sync::{Mutex, MutexGuard};

const NO_CONTEXT: &str = "[No specific context provided]";

#[derive(Default)]
pub struct MockProvider {
    requests: Mutex<Vec<CompletionRequest>>,
    failure: Option<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every completion fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    fn log(&self) -> MutexGuard<'_, Vec<CompletionRequest>> {
        // A poisoned log only means a test panicked mid-push; keep going.
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.log().clone()
    }

    pub fn call_count(&self) -> usize {
        self.log().len()
    }

    /// The response text this provider gives for `request`.
    pub fn render(request: &CompletionRequest) -> String {
        let system: String = request
            .system_prompt()
            .unwrap_or_default()
            .chars()
            .take(30)
            .collect::<String>()
            .trim()
            .replace('\n', "");
        let context = match request.context() {
            Some(ctx) => ctx.chars().take(150).collect(),
            None => NO_CONTEXT.to_string(),
        };

        format!(
            "This is a MOCKED LLM response to your query: '{}'.\n\
             Nomad would now provide a thoughtful, persona-consistent, and context-aware answer \
             based on the '{}...' module prompt, drawing from MEMORIES and Captain's Log state like:\n\
             {}...\nIt would then suggest next steps or ask clarifying questions if needed.",
            request.user_prompt().unwrap_or_default(),
            system,
            context
        )
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let content = Self::render(&request);
        self.log().push(request);

        if let Some(message) = &self.failure {
            return Err(Error::inference_failed(message.clone()).with_context("provider", "mock"));
        }

        Ok(CompletionResponse {
            model: self.default_model().to_string(),
            content: Some(content),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_response_echoes_request() {
        let provider = MockProvider::new();
        let context = "x".repeat(200);
        let text = provider
            .send_prompt("// ChartRoom\nObjective: plan your week well", "plan my week", Some(&context))
            .await;

        assert!(text.starts_with("This is a MOCKED LLM response to your query: 'plan my week'."));
        assert!(text.contains("based on the '// ChartRoomObjective: plan y...' module prompt"));
        assert!(text.contains(&format!("{}...", "x".repeat(150))));
        assert!(!text.contains(&"x".repeat(151)));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_without_context() {
        let provider = MockProvider::new();
        let text = provider.send_prompt("sys", "hi", None).await;
        assert!(text.contains(NO_CONTEXT));
    }

    #[tokio::test]
    async fn test_requests_are_recorded_in_order() {
        let provider = MockProvider::new();
        provider.send_prompt("a", "first", None).await;
        provider.send_prompt("b", "second", Some("ctx")).await;

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].user_prompt(), Some("first"));
        assert_eq!(requests[1].context(), Some("ctx"));
    }

    #[test]
    fn test_failure_becomes_marker() {
        let provider = MockProvider::failing("backend down");
        let text = tokio_test::block_on(provider.send_prompt("sys", "hi", None));
        assert_eq!(text, "[Error: Could not get response from mock: backend down]");
        assert_eq!(provider.call_count(), 1);
    }
}
