use crate::aggregate::{AggregatedForecast, RunResult, aggregate_categorical, option_run_rationale};
use crate::clients::ModelClient;
use crate::distribution::{ProbabilityDistribution, normalize_option_scores};
use crate::error::Result;
use crate::extractors::extract_option_scores;
use crate::prompts;
use crate::question::Question;
use crate::research::ResearchProvider;

use super::{ForecastEngine, RunStrategy};

/// Per-option mean of N normalized score vectors
#[derive(Debug, Clone)]
pub struct MultipleChoiceForecaster<M, R> {
    engine: ForecastEngine<M, R>,
}

impl<M: ModelClient, R: ResearchProvider> MultipleChoiceForecaster<M, R> {
    pub fn new(client: M, research: R) -> Self {
        Self::from_engine(ForecastEngine::new(client, research))
    }

    pub fn from_engine(engine: ForecastEngine<M, R>) -> Self {
        Self { engine }
    }

    pub async fn forecast(&self, question: &Question, runs: usize) -> Result<AggregatedForecast> {
        self.engine.run(question, runs, &MultipleChoiceRun).await
    }
}

pub(crate) struct MultipleChoiceRun;

impl RunStrategy for MultipleChoiceRun {
    type Context = Vec<String>;

    fn label(&self) -> &'static str {
        "multiple choice"
    }

    fn prepare(&self, question: &Question) -> Result<Vec<String>> {
        Ok(question.option_labels()?.to_vec())
    }

    fn prompt(&self, question: &Question, research: &str, today: &str) -> String {
        prompts::multiple_choice_prompt(question, research, today)
    }

    fn process(&self, labels: &Vec<String>, answer: &str) -> Result<RunResult> {
        let scores = extract_option_scores(answer, labels.len())?;
        let distribution = normalize_option_scores(labels, &scores)?;
        Ok(RunResult {
            distribution: ProbabilityDistribution::Categorical(distribution),
            rationale: option_run_rationale(&scores, answer),
        })
    }

    fn aggregate(&self, runs: Vec<RunResult>) -> Result<AggregatedForecast> {
        aggregate_categorical(runs)
    }
}
