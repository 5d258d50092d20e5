use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::OracleConfig;
use crate::error::{PipelineError, Result};
use crate::models::TokenUsage;

/// Role of a message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request to the LLM.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Overrides the client's default model.
    pub model: Option<String>,
}

/// Response from the LLM.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl LlmResponse {
    pub fn usage(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
        }
    }
}

/// Trait for LLM clients, enabling mocking in tests.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Anthropic API client implementation.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Deserialize)]
struct AnthropicErrorResponse {
    error: Option<AnthropicErrorDetail>,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

impl AnthropicClient {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(PipelineError::LlmApiRequest)?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.extraction_model.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/v1/messages", self.api_base_url);

        let body = AnthropicRequest {
            model: request.model.as_deref().unwrap_or(&self.model),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: &request.messages,
        };

        let base_delays = [
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
        ];
        let max_attempts = base_delays.len() + 1;

        let mut last_error: Option<PipelineError> = None;
        let mut next_delay = Duration::ZERO;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                debug!(attempt, "retrying LLM request after {:?}", next_delay);
                tokio::time::sleep(next_delay).await;
            }

            // Reset to the base exponential delay for the next potential retry
            next_delay = base_delays
                .get(attempt)
                .copied()
                .unwrap_or(base_delays[base_delays.len() - 1]);

            let resp = self
                .http
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await;

            let resp = match resp {
                Ok(r) => r,
                Err(e) => {
                    warn!(attempt, error = %e, "LLM request failed");
                    last_error = Some(PipelineError::LlmApiRequest(e));
                    continue;
                }
            };

            let status = resp.status().as_u16();

            if status == 429 {
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!(attempt, retry_after, "LLM rate limited");
                next_delay = Duration::from_secs(retry_after).max(next_delay);
                last_error = Some(PipelineError::LlmRateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status >= 500 {
                let body_text = resp.text().await.unwrap_or_default();
                warn!(attempt, status, body = %body_text, "LLM server error");
                last_error = Some(PipelineError::LlmApiError {
                    status,
                    message: body_text,
                });
                continue;
            }

            if status != 200 {
                let body_text = resp.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicErrorResponse>(&body_text)
                    .ok()
                    .and_then(|r| r.error)
                    .map(|e| e.message)
                    .unwrap_or(body_text);
                return Err(PipelineError::LlmApiError { status, message });
            }

            let api_response: AnthropicResponse = resp
                .json()
                .await
                .map_err(|e| PipelineError::LlmResponseParse(e.to_string()))?;

            let content = api_response
                .content
                .into_iter()
                .filter_map(|block| block.text)
                .collect::<Vec<_>>()
                .join("");

            if content.is_empty() {
                warn!(attempt, "LLM returned empty response");
                last_error = Some(PipelineError::LlmEmptyResponse);
                continue;
            }

            return Ok(LlmResponse {
                content,
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            });
        }

        Err(last_error.unwrap_or(PipelineError::LlmEmptyResponse))
    }
}

/// Test utilities for the LLM client.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Router = Box<dyn Fn(&LlmRequest) -> Result<LlmResponse> + Send + Sync>;

    enum Script {
        /// Pre-configured responses, returned in order.
        Queue(Mutex<Vec<Result<LlmResponse>>>),
        /// Response computed from the request.
        Route(Router),
    }

    /// Mock LLM client for testing.
    pub struct MockLlmClient {
        script: Script,
        calls: AtomicUsize,
        requests: Mutex<Vec<LlmRequest>>,
    }

    /// Successful response with fixed token counts.
    pub fn text_response(content: &str) -> Result<LlmResponse> {
        Ok(LlmResponse {
            content: content.to_string(),
            input_tokens: 100,
            output_tokens: 200,
        })
    }

    impl MockLlmClient {
        pub fn new(responses: Vec<Result<LlmResponse>>) -> Self {
            // Reverse so we can pop from the end
            let mut responses = responses;
            responses.reverse();
            Self {
                script: Script::Queue(Mutex::new(responses)),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_response(content: &str) -> Self {
            Self::new(vec![text_response(content)])
        }

        pub fn with_responses(contents: Vec<&str>) -> Self {
            Self::new(contents.into_iter().map(text_response).collect())
        }

        /// Answer every request with `route(request)`.
        ///
        /// Suited to concurrent callers, where queue order is not deterministic.
        pub fn routed<F>(route: F) -> Self
        where
            F: Fn(&LlmRequest) -> Result<LlmResponse> + Send + Sync + 'static,
        {
            Self {
                script: Script::Route(Box::new(route)),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Number of `complete` calls made so far.
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Copies of every request received.
        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests
                .lock()
                .map(|r| r.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }

            match &self.script {
                Script::Queue(responses) => {
                    let mut responses = responses.lock().map_err(|e| {
                        PipelineError::LlmResponseParse(format!("mock lock poisoned: {e}"))
                    })?;
                    responses.pop().unwrap_or(Err(PipelineError::LlmEmptyResponse))
                }
                Script::Route(route) => route(request),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::MockLlmClient;
    use super::*;

    fn request(content: &str) -> LlmRequest {
        LlmRequest {
            system: "system".into(),
            messages: vec![Message::user(content)],
            max_tokens: 16,
            temperature: 0.0,
            model: None,
        }
    }

    #[tokio::test]
    async fn test_mock_returns_in_order() {
        let mock = MockLlmClient::with_responses(vec!["first", "second"]);
        assert_eq!(mock.complete(&request("a")).await.unwrap().content, "first");
        assert_eq!(mock.complete(&request("b")).await.unwrap().content, "second");
        assert!(matches!(
            mock.complete(&request("c")).await,
            Err(PipelineError::LlmEmptyResponse)
        ));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_routed() {
        let mock = MockLlmClient::routed(|req| {
            let content = req.messages[0].content.to_uppercase();
            test_support::text_response(&content)
        });
        assert_eq!(mock.complete(&request("abc")).await.unwrap().content, "ABC");
        assert_eq!(mock.requests().len(), 1);
    }

    #[test]
    fn test_client_debug_redacts_key() {
        let config = OracleConfig::builder("sk-secret").build();
        let client = AnthropicClient::new(&config).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-secret"));
    }
}
