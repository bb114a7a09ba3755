// ABOUTME: Chat completion client for the external multimodal model endpoint
// ABOUTME: Handles configuration, API requests, HTTP error mapping, and usage logging

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::types::{ChatCompletionRequest, ChatCompletionResponse, CompletionMessage, Usage};
use vitrine_config::constants::{
    OPENAI_API_KEY, VITRINE_COMPLETION_API_KEY, VITRINE_COMPLETION_CONNECT_TIMEOUT_SECS,
    VITRINE_COMPLETION_MAX_TOKENS, VITRINE_COMPLETION_MODEL, VITRINE_COMPLETION_TEMPERATURE,
    VITRINE_COMPLETION_TIMEOUT_SECS, VITRINE_COMPLETION_URL,
};
use vitrine_config::{
    parse_env_or_default, parse_env_or_default_with_validation, parse_optional_env,
};

pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum AIServiceError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("No API key configured")]
    NoApiKey,

    #[error("Invalid response format")]
    InvalidResponse,
}

pub type AIServiceResult<T> = Result<T, AIServiceError>;

#[derive(Debug)]
pub struct AIResponse<T> {
    pub data: T,
    pub usage: Option<Usage>,
}

/// Endpoint settings for the completion client
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub endpoint_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// No client-side timeout when `None`; the transport's own limits apply
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_COMPLETION_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl CompletionConfig {
    /// Build configuration from environment variables
    /// The API key is read from VITRINE_COMPLETION_API_KEY, falling back to OPENAI_API_KEY
    pub fn from_env() -> Self {
        let api_key = std::env::var(VITRINE_COMPLETION_API_KEY)
            .or_else(|_| std::env::var(OPENAI_API_KEY))
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            info!("No completion API key set - recommendation requests will be rejected");
        }

        let model = parse_env_or_default(VITRINE_COMPLETION_MODEL, DEFAULT_MODEL.to_string());
        if model != DEFAULT_MODEL {
            info!("Using custom completion model: {}", model);
        }

        Self {
            endpoint_url: parse_env_or_default(
                VITRINE_COMPLETION_URL,
                DEFAULT_COMPLETION_URL.to_string(),
            ),
            api_key,
            model,
            max_tokens: parse_env_or_default_with_validation(
                VITRINE_COMPLETION_MAX_TOKENS,
                DEFAULT_MAX_TOKENS,
                |v| (1..=32_000).contains(&v),
            ),
            temperature: parse_env_or_default_with_validation(
                VITRINE_COMPLETION_TEMPERATURE,
                DEFAULT_TEMPERATURE,
                |v| (0.0..=2.0).contains(&v),
            ),
            request_timeout: parse_optional_env::<u64>(VITRINE_COMPLETION_TIMEOUT_SECS)
                .map(Duration::from_secs),
            connect_timeout: Duration::from_secs(parse_env_or_default_with_validation(
                VITRINE_COMPLETION_CONNECT_TIMEOUT_SECS,
                DEFAULT_CONNECT_TIMEOUT_SECS,
                |v| v > 0,
            )),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = endpoint_url.into();
        self
    }
}

/// A text-and-image-in, text-out completion backend
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Whether a credential is configured; requests without one are never sent
    fn has_credentials(&self) -> bool;

    /// Issue exactly one completion call and return the raw text of the first choice
    async fn complete(&self, messages: &[CompletionMessage]) -> AIServiceResult<AIResponse<String>>;
}

/// reqwest-backed completion client
pub struct CompletionClient {
    client: Client,
    config: CompletionConfig,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> AIServiceResult<Self> {
        let mut builder = Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> AIServiceResult<Self> {
        Self::new(CompletionConfig::from_env())
    }

    /// Get the model being used by this client
    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }
}

#[async_trait]
impl CompletionService for CompletionClient {
    fn has_credentials(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn complete(&self, messages: &[CompletionMessage]) -> AIServiceResult<AIResponse<String>> {
        let api_key = self.config.api_key.as_ref().ok_or(AIServiceError::NoApiKey)?;

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let images: usize = messages.iter().map(|m| m.content.image_count()).sum();
        info!(
            "Making completion request: model={}, max_tokens={}, messages={}, images={}",
            request.model,
            request.max_tokens,
            messages.len(),
            images
        );

        let response = self
            .client
            .post(&self.config.endpoint_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Completion request timed out");
                    AIServiceError::ApiError(
                        "Request timed out. The recommendation service may be overloaded."
                            .to_string(),
                    )
                } else if e.is_connect() {
                    error!("Failed to connect to completion endpoint: {}", e);
                    AIServiceError::ApiError(format!(
                        "Connection failed: {}. Please check your internet connection.",
                        e
                    ))
                } else {
                    error!("Completion request failed: {}", e);
                    AIServiceError::RequestFailed(e)
                }
            })?;

        info!("Received completion response: status={}", response.status());

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Completion API error: {} - {}", status, error_text);
            return Err(AIServiceError::ApiError(format!(
                "API returned {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AIServiceError::ParseError(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AIServiceError::InvalidResponse)?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Completion usage: prompt_tokens={}, completion_tokens={}, total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens()
            );
        }

        Ok(AIResponse {
            data: text,
            usage: completion.usage,
        })
    }
}
