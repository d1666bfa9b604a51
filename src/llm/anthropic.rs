// ABOUTME: Anthropic messages API provider for generative nutrition estimates
// ABOUTME: Sends the system prompt separately and extracts the first text content block
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! # Anthropic Provider
//!
//! Environment:
//! - `ANTHROPIC_API_KEY` (required)
//! - `ANTHROPIC_MODEL` (default: `claude-3-5-haiku-latest`)
//! - `ANTHROPIC_BASE_URL` (default: <https://api.anthropic.com/v1>)

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use larder_core::constants::network::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use larder_core::errors::{AppError, ProviderError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{
    error_message_from_body, ChatRequest, ChatResponse, LlmProvider, MessageRole, TokenUsage,
};

const PROVIDER: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<MessageParam<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct MessageParam<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Anthropic provider configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,
    /// Base URL, without the `/messages` suffix
    pub base_url: String,
    /// Default model
    pub default_model: String,
    /// Token budget when the request does not set one
    pub max_tokens: u32,
}

impl AnthropicConfig {
    /// Configuration for `api_key` with default endpoint and model
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            default_model: DEFAULT_MODEL.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Point at another endpoint (tests, proxies)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Anthropic messages API client
pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create a provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: AnthropicConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create a provider from `ANTHROPIC_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `ANTHROPIC_API_KEY` is unset or the HTTP client cannot be created.
    pub fn from_env() -> Result<Self, AppError> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("ANTHROPIC_API_KEY".to_owned()))?;
        let mut config = AnthropicConfig::new(api_key);
        if let Ok(model) = env::var("ANTHROPIC_MODEL") {
            config.default_model = model;
        }
        if let Ok(base_url) = env::var("ANTHROPIC_BASE_URL") {
            config.base_url = base_url;
        }
        Self::new(config)
    }

    fn parse_error_response(status: StatusCode, retry_after: Option<u64>, body: &str) -> AppError {
        let message = error_message_from_body(body);
        let error = match status.as_u16() {
            401 | 403 => ProviderError::Authentication {
                provider: PROVIDER.to_owned(),
                message,
            },
            429 | 529 => ProviderError::QuotaExceeded {
                provider: PROVIDER.to_owned(),
                retry_after_secs: retry_after,
            },
            code => ProviderError::Api {
                provider: PROVIDER.to_owned(),
                status: code,
                message,
            },
        };
        error.into()
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);
        let messages = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| MessageParam {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();
        let body = MessagesRequest {
            model,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            system: request.system_prompt(),
            messages,
            temperature: request.temperature,
        };

        let url = format!("{}/messages", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::from(ProviderError::from_reqwest(PROVIDER, &e)))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let text = response
            .text()
            .await
            .map_err(|e| AppError::from(ProviderError::from_reqwest(PROVIDER, &e)))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Anthropic request failed");
            return Err(Self::parse_error_response(status, retry_after, &text));
        }

        let parsed: MessagesResponse = serde_json::from_str(&text).map_err(|e| {
            AppError::from(ProviderError::MalformedResponse {
                provider: PROVIDER.to_owned(),
                message: e.to_string(),
            })
        })?;

        let content = parsed
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| {
                AppError::from(ProviderError::MalformedResponse {
                    provider: PROVIDER.to_owned(),
                    message: "no text content in response".to_owned(),
                })
            })?;

        debug!(chars = content.len(), stop_reason = ?parsed.stop_reason, "Anthropic response received");

        Ok(ChatResponse {
            content,
            model: parsed.model,
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            }),
            finish_reason: parsed.stop_reason,
        })
    }
}
