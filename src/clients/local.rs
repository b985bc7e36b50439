use async_trait::async_trait;
use reqwest::Client;

use super::chat::{ChatRequest, build_http_client, completions_url, post_with_retries};
use super::{AdmissionGate, ModelClient, ModelError};
use crate::config::Config;

const NO_THINK_DIRECTIVE: &str = "\n\\no_think\n";

/// Client for a local OpenAI-compatible model server
#[derive(Clone, Debug)]
pub struct LocalClient {
    http: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
    retry_delay_ms: u64,
    no_think: bool,
    gate: AdmissionGate,
}

impl LocalClient {
    pub fn new(config: &Config, gate: AdmissionGate) -> Result<Self, ModelError> {
        Ok(Self {
            http: build_http_client(config.llm.request_timeout_ms)?,
            endpoint: completions_url(&config.runtime.local_llm_base_url),
            model: config.llm.local_model.clone(),
            temperature: config.llm.local_temperature,
            max_tokens: config.llm.local_max_tokens,
            max_retries: config.llm.local_max_retries,
            retry_delay_ms: config.llm.retry_delay_ms,
            no_think: config.llm.local_no_think,
            gate,
        })
    }

    fn prepare_prompt(&self, prompt: &str) -> String {
        if self.no_think {
            format!("{prompt}{NO_THINK_DIRECTIVE}")
        } else {
            prompt.to_string()
        }
    }
}

#[async_trait]
impl ModelClient for LocalClient {
    async fn call(
        &self,
        prompt: &str,
        model: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String, ModelError> {
        let model = model.unwrap_or(&self.model);
        let prompt = self.prepare_prompt(prompt);

        let mut request = ChatRequest::user(model, &prompt);
        request.temperature = Some(temperature.unwrap_or(self.temperature));
        request.max_tokens = Some(self.max_tokens);

        tracing::info!(
            "Calling local model={} ({}), temperature={:?}",
            model,
            if self.no_think { "no think" } else { "think" },
            request.temperature
        );

        let _permit = self.gate.acquire().await?;
        post_with_retries(
            &self.http,
            &self.endpoint,
            None,
            &request,
            self.max_retries,
            self.retry_delay_ms,
        )
        .await
    }
}
