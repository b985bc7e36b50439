use crate::aggregate::{AggregatedForecast, RunResult, aggregate_binary, binary_run_rationale};
use crate::clients::ModelClient;
use crate::distribution::{ProbabilityDistribution, binary_probability};
use crate::error::Result;
use crate::extractors::extract_binary_probability;
use crate::prompts;
use crate::question::Question;
use crate::research::ResearchProvider;

use super::{ForecastEngine, RunStrategy};

/// Median of N extracted yes-probabilities
#[derive(Debug, Clone)]
pub struct BinaryForecaster<M, R> {
    engine: ForecastEngine<M, R>,
}

impl<M: ModelClient, R: ResearchProvider> BinaryForecaster<M, R> {
    pub fn new(client: M, research: R) -> Self {
        Self::from_engine(ForecastEngine::new(client, research))
    }

    pub fn from_engine(engine: ForecastEngine<M, R>) -> Self {
        Self { engine }
    }

    pub async fn forecast(&self, question: &Question, runs: usize) -> Result<AggregatedForecast> {
        self.engine.run(question, runs, &BinaryRun).await
    }
}

pub(crate) struct BinaryRun;

impl RunStrategy for BinaryRun {
    type Context = ();

    fn label(&self) -> &'static str {
        "binary"
    }

    fn prepare(&self, _question: &Question) -> Result<()> {
        Ok(())
    }

    fn prompt(&self, question: &Question, research: &str, today: &str) -> String {
        prompts::binary_prompt(question, research, today)
    }

    fn process(&self, _context: &(), answer: &str) -> Result<RunResult> {
        let probability = binary_probability(extract_binary_probability(answer)?);
        Ok(RunResult {
            distribution: ProbabilityDistribution::Binary(probability),
            rationale: binary_run_rationale(probability, answer),
        })
    }

    fn aggregate(&self, runs: Vec<RunResult>) -> Result<AggregatedForecast> {
        aggregate_binary(runs)
    }
}
