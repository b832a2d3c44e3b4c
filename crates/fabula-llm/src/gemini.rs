//! Google Gemini adapter implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    error::LLMError,
    traits::{FinishReason, LLMAdapter, LLMMessage, LLMResponse, Role, TokenUsage},
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Gemini adapter.
pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
}

impl GeminiAdapter {
    /// Create a new Gemini adapter.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Google AI API key
    /// * `model` - Model to use (e.g., "gemini-2.0-flash", "gemini-1.5-flash")
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            timeout: None,
        }
    }

    /// Set the temperature for generation.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum tokens for generation.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set a per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the API URL for the model.
    fn api_url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        )
    }

    /// Convert adapter messages to the Gemini wire format.
    ///
    /// Gemini carries the system prompt out of band (`systemInstruction`) and
    /// names the assistant role "model".
    fn convert_messages(
        messages: &[LLMMessage],
    ) -> (Option<GeminiSystemInstruction>, Vec<GeminiContent>) {
        let system_instruction = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| GeminiSystemInstruction {
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            });

        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| GeminiContent {
                role: match m.role {
                    Role::Assistant => "model".to_string(),
                    _ => "user".to_string(),
                },
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        (system_instruction, contents)
    }

    fn map_send_error(e: reqwest::Error) -> LLMError {
        if e.is_timeout() {
            LLMError::Timeout
        } else {
            LLMError::ConnectionError(e.to_string())
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: GeminiContent,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: u32,
    candidates_token_count: u32,
    total_token_count: u32,
}

#[derive(Deserialize)]
struct GeminiApiError {
    error: GeminiApiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiApiErrorDetail {
    message: String,
}

#[async_trait]
impl LLMAdapter for GeminiAdapter {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, messages), fields(provider = "gemini", model = %self.model))]
    async fn generate(&self, messages: &[LLMMessage]) -> Result<LLMResponse, LLMError> {
        debug!("Generating completion with {} messages", messages.len());

        let (system_instruction, contents) = Self::convert_messages(messages);

        let request = GeminiRequest {
            contents,
            system_instruction,
            generation_config: Some(GeminiGenerationConfig {
                temperature: Some(self.temperature),
                max_output_tokens: self.max_tokens,
            }),
        };

        let mut builder = self
            .client
            .post(self.api_url())
            .header("content-type", "application/json")
            .json(&request);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error: GeminiApiError = response
                .json()
                .await
                .map_err(|e| LLMError::InvalidResponse(e.to_string()))?;
            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationError(error.error.message),
                429 => LLMError::RateLimitError(error.error.message),
                _ => LLMError::ApiError(error.error.message),
            });
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LLMError::InvalidResponse(e.to_string()))?;

        let candidate = api_response
            .candidates
            .first()
            .ok_or(LLMError::EmptyResponse)?;

        let content = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("MAX_TOKENS") => FinishReason::Length,
            _ => FinishReason::Stop,
        };

        let tokens_used = api_response
            .usage_metadata
            .map(|u| TokenUsage {
                prompt: u.prompt_token_count,
                completion: u.candidates_token_count,
                total: u.total_token_count,
            })
            .unwrap_or_default();

        Ok(LLMResponse {
            content,
            tokens_used,
            finish_reason,
            model: api_response
                .model_version
                .unwrap_or_else(|| self.model.clone()),
        })
    }

    async fn health_check(&self) -> Result<bool, LLMError> {
        // Model metadata endpoint to check API connectivity
        let url = format!("{}/{}?key={}", GEMINI_API_BASE, self.model, self.api_key);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Ok(response.status().is_success())
    }
}
