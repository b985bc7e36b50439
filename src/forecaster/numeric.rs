use crate::aggregate::{AggregatedForecast, RunResult, aggregate_cdf, percentile_run_rationale};
use crate::clients::ModelClient;
use crate::distribution::{CdfSpec, ProbabilityDistribution, synthesize_cdf};
use crate::error::Result;
use crate::extractors::extract_percentiles;
use crate::prompts;
use crate::question::Question;
use crate::research::ResearchProvider;

use super::{ForecastEngine, RunStrategy};

/// Elementwise median of N synthesized CDFs. Serves numeric and discrete questions;
/// the grid size comes from the question.
#[derive(Debug, Clone)]
pub struct NumericForecaster<M, R> {
    engine: ForecastEngine<M, R>,
}

impl<M: ModelClient, R: ResearchProvider> NumericForecaster<M, R> {
    pub fn new(client: M, research: R) -> Self {
        Self::from_engine(ForecastEngine::new(client, research))
    }

    pub fn from_engine(engine: ForecastEngine<M, R>) -> Self {
        Self { engine }
    }

    pub async fn forecast(&self, question: &Question, runs: usize) -> Result<AggregatedForecast> {
        self.engine.run(question, runs, &NumericRun).await
    }
}

pub(crate) struct NumericRun;

impl RunStrategy for NumericRun {
    type Context = CdfSpec;

    fn label(&self) -> &'static str {
        "numeric"
    }

    fn prepare(&self, question: &Question) -> Result<CdfSpec> {
        let spec = question.cdf_spec()?;
        spec.validate()?;
        Ok(spec)
    }

    fn prompt(&self, question: &Question, research: &str, today: &str) -> String {
        prompts::numeric_prompt(question, research, today)
    }

    fn process(&self, spec: &CdfSpec, answer: &str) -> Result<RunResult> {
        let percentiles = extract_percentiles(answer)?;
        let cdf = synthesize_cdf(&percentiles, spec)?;
        Ok(RunResult {
            distribution: ProbabilityDistribution::Cdf(cdf),
            rationale: percentile_run_rationale(&percentiles, answer),
        })
    }

    fn aggregate(&self, runs: Vec<RunResult>) -> Result<AggregatedForecast> {
        aggregate_cdf(runs)
    }
}
