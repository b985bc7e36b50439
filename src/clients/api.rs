//! Hosted OpenAI-compatible API client (OpenRouter, OpenAI)

use async_trait::async_trait;
use reqwest::Client;

use super::chat::{ChatRequest, build_http_client, completions_url, post_with_retries};
use super::{AdmissionGate, ModelClient, ModelError};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    default_model: String,
    default_temperature: f32,
    models_without_temperature: Vec<String>,
    max_retries: u32,
    retry_delay_ms: u64,
    gate: AdmissionGate,
}

impl ApiClient {
    pub fn new(config: &Config, gate: AdmissionGate) -> Result<Self, ModelError> {
        let api_key = config.runtime.api_key().ok_or_else(|| {
            ModelError::NotConfigured("set OPENROUTER_API_KEY or OPENAI_API_KEY".to_string())
        })?;

        Ok(Self {
            http: build_http_client(config.llm.request_timeout_ms)?,
            endpoint: completions_url(&config.runtime.openrouter_base_url),
            api_key: api_key.to_string(),
            default_model: config.bot.default_model.clone(),
            default_temperature: config.bot.default_temperature,
            models_without_temperature: config.llm.models_without_temperature.clone(),
            max_retries: config.llm.max_retries,
            retry_delay_ms: config.llm.retry_delay_ms,
            gate,
        })
    }

    fn accepts_temperature(&self, model: &str) -> bool {
        !self.models_without_temperature.iter().any(|m| m == model)
    }
}

#[async_trait]
impl ModelClient for ApiClient {
    async fn call(
        &self,
        prompt: &str,
        model: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String, ModelError> {
        let model = model.unwrap_or(&self.default_model);
        let temperature = temperature.unwrap_or(self.default_temperature);

        let mut request = ChatRequest::user(model, prompt);
        if self.accepts_temperature(model) {
            request.temperature = Some(temperature);
        }

        tracing::info!(
            "Calling API model={} temperature={:?}",
            model,
            request.temperature
        );

        let _permit = self.gate.acquire().await?;
        post_with_retries(
            &self.http,
            &self.endpoint,
            Some(&self.api_key),
            &request,
            self.max_retries,
            self.retry_delay_ms,
        )
        .await
    }
}
