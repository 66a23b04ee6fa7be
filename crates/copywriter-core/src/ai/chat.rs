use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::GenerateError;
use crate::prompt::AssembledPrompt;

pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Why a completion produced no text. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionFailure {
    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Request failed: {0}")]
    Network(String),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response from API: {0}")]
    Malformed(String),

    #[error("API returned no completion choices")]
    NoChoices,
}

/// Outcome of exactly one chat-completion call. Never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionResult {
    Success(String),
    Failure(CompletionFailure),
}

impl CompletionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CompletionResult::Success(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            CompletionResult::Success(text) => Some(text),
            CompletionResult::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<String, CompletionFailure> {
        match self {
            CompletionResult::Success(text) => Ok(text),
            CompletionResult::Failure(failure) => Err(failure),
        }
    }
}

/// Anything that can turn an assembled prompt into generated copy.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &AssembledPrompt) -> CompletionResult;

    /// Model identifier, for display and logging.
    fn model(&self) -> &str;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Build a client for the configured provider, failing if no key is available.
    pub fn from_config(config: &Config) -> Result<Self, GenerateError> {
        let provider = config.provider();
        let api_key = config
            .api_key(provider)
            .ok_or(GenerateError::MissingCredential(provider))?;

        Ok(Self::new(&config.base_url(), &api_key, &config.model())
            .with_max_tokens(config.max_tokens())
            .with_timeout(Duration::from_secs(config.timeout_secs())))
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn query(&self, prompt: &AssembledPrompt) -> CompletionResult {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system_message,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user_message,
                },
            ],
            max_tokens: self.max_tokens,
        };

        tracing::info!(
            endpoint = %self.endpoint,
            model = %self.model,
            "Sending completion request"
        );

        let response = match self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return CompletionResult::Failure(self.classify(e)),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return CompletionResult::Failure(self.classify(e)),
        };

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Completion request rejected");
            return CompletionResult::Failure(CompletionFailure::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        match parse_completion(&body) {
            Ok(text) => {
                tracing::debug!(chars = text.chars().count(), "Completion received");
                CompletionResult::Success(text)
            }
            Err(failure) => {
                tracing::warn!(error = %failure, "Completion response unusable");
                CompletionResult::Failure(failure)
            }
        }
    }

    fn classify(&self, error: reqwest::Error) -> CompletionFailure {
        tracing::warn!(error = %error, "Completion request failed");
        if error.is_timeout() {
            CompletionFailure::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            CompletionFailure::Network(error.to_string())
        }
    }
}

#[async_trait]
impl CompletionBackend for ChatClient {
    async fn complete(&self, prompt: &AssembledPrompt) -> CompletionResult {
        self.query(prompt).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn parse_completion(body: &str) -> Result<String, CompletionFailure> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionFailure::Malformed(e.to_string()))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(CompletionFailure::NoChoices)?;

    choice
        .message
        .content
        .ok_or_else(|| CompletionFailure::Malformed("first choice has no content".to_string()))
}
