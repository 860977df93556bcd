//! LLM provider abstraction and implementations.
//!
//! Handlers never talk to a vendor API directly; they go through
//! [`TextProvider`] so the hosted model can be swapped for the scripted mock.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use service_core::error::AppError;
use service_core::retry::Retryable;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited | ProviderError::NetworkError(_)
        )
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => AppError::ServiceUnavailable(msg),
            ProviderError::NetworkError(msg) => {
                AppError::ServiceUnavailable(format!("Model unreachable: {}", msg))
            }
            ProviderError::RateLimited => AppError::TooManyRequests(
                "The tutor is busy right now. Please try again shortly.".to_string(),
                Some(5),
            ),
            ProviderError::ContentFiltered => {
                AppError::BadRequest(anyhow::anyhow!("Request was blocked by the content filter"))
            }
            ProviderError::InvalidRequest(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ProviderError::ApiError(msg) => AppError::BadGateway(msg),
        }
    }
}

/// Result of a provider call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
}

/// Generation parameters for a model call.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<i32>,
    /// Persona / behavior instructions sent separately from the prompt.
    pub system_instruction: Option<String>,
    /// Ask the model for a JSON document instead of prose.
    pub json_output: bool,
}

/// Trait for text/JSON generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Model identifier recorded with usage.
    fn model(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    async fn health_check(&self) -> Result<(), ProviderError>;
}
