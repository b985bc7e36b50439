//! Research providers that produce the background report fed into every forecast prompt.

use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::{ModelClient, ModelError};
use crate::config::Config;
use crate::prompts;
use crate::question::Question;

pub const NO_RESEARCH_REPORT: &str = "No research was conducted for this question.";

/// Gathers a research report for a question. Never fails: a provider that cannot
/// finish returns a short explanation instead so the forecast can still proceed.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn conduct_research(&self, question: &Question) -> String;
}

#[async_trait]
impl<T: ResearchProvider + ?Sized> ResearchProvider for Arc<T> {
    async fn conduct_research(&self, question: &Question) -> String {
        (**self).conduct_research(question).await
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoResearch;

#[async_trait]
impl ResearchProvider for NoResearch {
    async fn conduct_research(&self, question: &Question) -> String {
        tracing::debug!("Research disabled for '{}'", question.title);
        NO_RESEARCH_REPORT.to_string()
    }
}

/// Five sequential model calls: field, entities, entity analysis, news, final report.
#[derive(Debug, Clone)]
pub struct LlmResearchProvider<M> {
    client: M,
    model: String,
    temperature: f32,
}

impl<M: ModelClient> LlmResearchProvider<M> {
    pub fn new(client: M, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }

    pub fn from_config(client: M, config: &Config) -> Self {
        Self::new(
            client,
            config.bot.research_model.clone(),
            config.bot.research_temperature,
        )
    }

    async fn ask(&self, prompt: &str) -> Result<String, ModelError> {
        self.client
            .call(prompt, Some(&self.model), Some(self.temperature))
            .await
    }

    async fn run_steps(&self, question: &Question) -> Result<String, ModelError> {
        let title = question.title.as_str();
        let field_context = question.field.as_deref().unwrap_or("");

        tracing::info!("[Step 1/5] Classifying question into field");
        let field = self
            .ask(&prompts::classify_question_prompt(title, field_context))
            .await?;
        tracing::debug!("Field classification:\n{}", field);

        tracing::info!("[Step 2/5] Identifying related entities");
        let entities = self
            .ask(&prompts::search_entities_prompt(title, &field))
            .await?;
        tracing::debug!("Entities:\n{}", entities);

        tracing::info!("[Step 3/5] Analyzing entities");
        let analysis = self
            .ask(&prompts::analyze_entities_prompt(title, &entities))
            .await?;

        tracing::info!("[Step 4/5] Summarizing recent news");
        let news = self
            .ask(&prompts::search_news_prompt(title, &field, &entities))
            .await?;

        tracing::info!("[Step 5/5] Writing final report");
        self.ask(&prompts::final_report_prompt(title, &field, &analysis, &news))
            .await
    }
}

#[async_trait]
impl<M: ModelClient> ResearchProvider for LlmResearchProvider<M> {
    async fn conduct_research(&self, question: &Question) -> String {
        tracing::info!(
            "Running multi-step research with {} for '{}'",
            self.model,
            question.title
        );
        match self.run_steps(question).await {
            Ok(report) => {
                tracing::debug!("Research report ({} chars)", report.len());
                report
            }
            Err(e) => {
                tracing::warn!("Research failed: {}", e);
                format!("Research could not be completed: {e}")
            }
        }
    }
}
