use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use redsum_llm::{ChatClient, ChatOptions, ChatRequest};
use redsum_types::GenerationSettings;

use crate::prompt::BuiltPrompt;

/// Result of driving one prompt, with the number of calls it took.
#[derive(Debug)]
pub struct DriverOutput {
    pub attempts: usize,
    pub result: Result<String>,
}

/// Sends prompts to the chat client: one call per attempt, bounded by a
/// timeout, retried once after `retry_delay`.
#[derive(Clone)]
pub struct CompletionDriver {
    client: Arc<dyn ChatClient>,
    call_timeout: Duration,
    retry_delay: Duration,
    temperature: Option<f32>,
}

impl CompletionDriver {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            client,
            call_timeout: Duration::from_secs(60),
            retry_delay: Duration::from_millis(500),
            temperature: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub async fn complete(&self, prompt: &BuiltPrompt, settings: &GenerationSettings) -> DriverOutput {
        match self.attempt(prompt, settings).await {
            Ok(text) => DriverOutput {
                attempts: 1,
                result: Ok(text),
            },
            Err(first) => {
                tracing::warn!(error = %first, delay_ms = self.retry_delay.as_millis() as u64, "Completion failed, retrying once");
                tokio::time::sleep(self.retry_delay).await;
                DriverOutput {
                    attempts: 2,
                    result: self.attempt(prompt, settings).await,
                }
            }
        }
    }

    async fn attempt(&self, prompt: &BuiltPrompt, settings: &GenerationSettings) -> Result<String> {
        let max_tokens = u32::try_from(prompt.max_output_tokens).unwrap_or(u32::MAX);
        let mut options = ChatOptions::new().max_tokens(max_tokens);
        if let Some(temperature) = self.temperature {
            options = options.temperature(temperature);
        }

        let request = ChatRequest::new(settings.selected_model(), prompt.messages()).with_options(options);

        let response = tokio::time::timeout(self.call_timeout, self.client.chat(request))
            .await
            .map_err(|_| anyhow!("completion timed out after {:?}", self.call_timeout))??;

        if response.is_truncated() {
            tracing::debug!(max_tokens, "Completion stopped at the output limit");
        }

        let text = response
            .content
            .ok_or_else(|| anyhow!("completion returned no content"))?;

        Ok(text.trim().to_string())
    }
}
