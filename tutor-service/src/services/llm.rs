//! Model access shared by every agent.

use crate::agents::AgentKind;
use crate::models::UsageRecord;
use crate::services::metrics::{LLM_CALLS_TOTAL, LLM_LATENCY, LLM_TOKENS_TOTAL};
use crate::services::providers::{GenerationParams, ProviderError, TextProvider};
use service_core::retry::{retry_with_backoff, RetryConfig};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Text returned by the model plus what it cost.
#[derive(Debug, Clone)]
pub struct Completion {
    pub agent: AgentKind,
    pub model: String,
    pub text: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
}

impl Completion {
    pub fn usage(&self, student_id: Uuid, session_id: Option<Uuid>) -> UsageRecord {
        UsageRecord::new(
            student_id,
            session_id,
            self.agent.as_str(),
            &self.model,
            self.input_tokens,
            self.output_tokens,
        )
    }
}

/// Wraps a [`TextProvider`] with retries, default sampling and metrics.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn TextProvider>,
    retry: RetryConfig,
    default_temperature: f32,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn TextProvider>, max_retries: u32, default_temperature: f32) -> Self {
        Self {
            provider,
            retry: RetryConfig::with_max_retries(max_retries),
            default_temperature,
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub async fn health_check(&self) -> Result<(), ProviderError> {
        self.provider.health_check().await
    }

    #[instrument(skip(self, agent, prompt, params), fields(agent = agent.as_str(), model = self.provider.model()))]
    pub async fn complete(
        &self,
        agent: AgentKind,
        prompt: &str,
        mut params: GenerationParams,
    ) -> Result<Completion, ProviderError> {
        if params.temperature.is_none() {
            params.temperature = Some(self.default_temperature);
        }

        let timer = LLM_LATENCY
            .with_label_values(&[agent.as_str()])
            .start_timer();

        let provider = &self.provider;
        let params = &params;
        let result = retry_with_backoff(&self.retry, agent.as_str(), move || {
            provider.generate(prompt, params)
        })
        .await;

        timer.observe_duration();

        match result {
            Ok(response) => {
                LLM_CALLS_TOTAL
                    .with_label_values(&[agent.as_str(), "success"])
                    .inc();
                LLM_TOKENS_TOTAL
                    .with_label_values(&[agent.as_str(), "input"])
                    .inc_by(response.input_tokens.max(0) as f64);
                LLM_TOKENS_TOTAL
                    .with_label_values(&[agent.as_str(), "output"])
                    .inc_by(response.output_tokens.max(0) as f64);

                info!(
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    "Model call completed"
                );

                Ok(Completion {
                    agent,
                    model: self.provider.model().to_string(),
                    text: response.text,
                    input_tokens: response.input_tokens,
                    output_tokens: response.output_tokens,
                })
            }
            Err(e) => {
                LLM_CALLS_TOTAL
                    .with_label_values(&[agent.as_str(), "error"])
                    .inc();
                warn!(error = %e, "Model call failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::{MockTextProvider, MOCK_MODEL};
    use std::time::Duration;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            backoff_multiplier: 2.0,
            add_jitter: false,
        }
    }

    #[tokio::test]
    async fn retries_rate_limits_then_returns_text() {
        let mock = Arc::new(MockTextProvider::new());
        mock.push_error(ProviderError::RateLimited);
        mock.push_response("Photosynthesis turns light into sugar.");

        let client = LlmClient::new(mock.clone(), 2, 0.5).with_retry_config(fast_retry());
        let completion = client
            .complete(AgentKind::Tutor, "explain", GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(completion.text, "Photosynthesis turns light into sugar.");
        assert_eq!(completion.model, MOCK_MODEL);
        assert_eq!(mock.prompts().len(), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let mock = Arc::new(MockTextProvider::new());
        mock.push_error(ProviderError::ContentFiltered);

        let client = LlmClient::new(mock.clone(), 3, 0.5).with_retry_config(fast_retry());
        let err = client
            .complete(AgentKind::Lesson, "x", GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::ContentFiltered));
        assert_eq!(mock.prompts().len(), 1);
    }

    #[tokio::test]
    async fn usage_record_carries_agent_and_model() {
        let client = LlmClient::new(Arc::new(MockTextProvider::new()), 0, 0.5);
        let completion = client
            .complete(AgentKind::Quiz, "abcdefgh", GenerationParams::default())
            .await
            .unwrap();

        let student = Uuid::new_v4();
        let usage = completion.usage(student, None);
        assert_eq!(usage.agent, "quiz");
        assert_eq!(usage.model, MOCK_MODEL);
        assert_eq!(usage.input_tokens, 2);
        assert_eq!(usage.student_id, student);
    }
}
