//! Forecast façades: research once, prompt once, N concurrent runs, one aggregate.
//!
//! Each question type plugs a [`RunStrategy`] into the shared [`ForecastEngine`]. The
//! strategy validates the question, renders the prompt, turns one raw answer into a
//! [`RunResult`] and folds the finished runs. The engine owns sequencing, concurrency
//! and failure propagation.

pub mod binary;
pub mod multiple_choice;
pub mod numeric;

use futures_util::future::join_all;

pub use binary::BinaryForecaster;
pub use multiple_choice::MultipleChoiceForecaster;
pub use numeric::NumericForecaster;

use crate::aggregate::{AggregatedForecast, RunResult};
use crate::clients::ModelClient;
use crate::error::{ForecastError, Result};
use crate::question::{Question, QuestionKind};
use crate::research::ResearchProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastPhase {
    Validating,
    Researching,
    Prompting,
    Running,
    Aggregating,
    Done,
    Failed,
}

impl std::fmt::Display for ForecastPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ForecastPhase::Validating => "validating",
            ForecastPhase::Researching => "researching",
            ForecastPhase::Prompting => "prompting",
            ForecastPhase::Running => "running",
            ForecastPhase::Aggregating => "aggregating",
            ForecastPhase::Done => "done",
            ForecastPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Phase bookkeeping for one forecast. Transitions are traced; a failure records
/// which phase it happened in.
#[derive(Debug)]
struct PhaseTracker<'a> {
    title: &'a str,
    phase: ForecastPhase,
}

impl<'a> PhaseTracker<'a> {
    fn new(title: &'a str) -> Self {
        Self {
            title,
            phase: ForecastPhase::Validating,
        }
    }

    fn enter(&mut self, next: ForecastPhase) {
        tracing::debug!("'{}': {} -> {}", self.title, self.phase, next);
        self.phase = next;
    }

    fn fail(&mut self, err: ForecastError) -> ForecastError {
        tracing::error!(
            "'{}' failed while {}: {} ({})",
            self.title,
            self.phase,
            err,
            err.kind()
        );
        self.phase = ForecastPhase::Failed;
        err
    }
}

/// Per-question-type behaviour plugged into the engine
pub(crate) trait RunStrategy: Send + Sync {
    /// Validated question data each run needs (labels, CDF inputs, ...)
    type Context: Send + Sync;

    fn label(&self) -> &'static str;

    fn prepare(&self, question: &Question) -> Result<Self::Context>;

    fn prompt(&self, question: &Question, research: &str, today: &str) -> String;

    fn process(&self, context: &Self::Context, answer: &str) -> Result<RunResult>;

    fn aggregate(&self, runs: Vec<RunResult>) -> Result<AggregatedForecast>;
}

/// Model client and research provider shared by all façades
#[derive(Debug, Clone)]
pub struct ForecastEngine<M, R> {
    client: M,
    research: R,
    model: Option<String>,
    temperature: Option<f32>,
}

impl<M: ModelClient, R: ResearchProvider> ForecastEngine<M, R> {
    pub fn new(client: M, research: R) -> Self {
        Self {
            client,
            research,
            model: None,
            temperature: None,
        }
    }

    /// Override the model and temperature sent with every run. Unset values fall back
    /// to the client's own defaults.
    pub fn with_model(mut self, model: Option<String>, temperature: Option<f32>) -> Self {
        self.model = model;
        self.temperature = temperature;
        self
    }

    pub(crate) async fn run<S: RunStrategy>(
        &self,
        question: &Question,
        runs: usize,
        strategy: &S,
    ) -> Result<AggregatedForecast> {
        let mut tracker = PhaseTracker::new(&question.title);
        self.run_tracked(question, runs, strategy, &mut tracker).await
    }

    async fn run_tracked<S: RunStrategy>(
        &self,
        question: &Question,
        runs: usize,
        strategy: &S,
        tracker: &mut PhaseTracker<'_>,
    ) -> Result<AggregatedForecast> {
        let context = validate(strategy, question, runs).map_err(|e| tracker.fail(e))?;

        tracing::info!(
            "Starting {} forecast with {} runs: {}",
            strategy.label(),
            runs,
            question.title
        );
        tracker.enter(ForecastPhase::Researching);
        let research = self.research.conduct_research(question).await;

        tracker.enter(ForecastPhase::Prompting);
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        let prompt = strategy.prompt(question, &research, &today);

        tracker.enter(ForecastPhase::Running);
        let pending = (0..runs).map(|index| self.single_run(index, &prompt, strategy, &context));
        let finished = join_all(pending)
            .await
            .into_iter()
            .collect::<Result<Vec<RunResult>>>()
            .map_err(|e| tracker.fail(e))?;

        tracker.enter(ForecastPhase::Aggregating);
        let forecast = strategy.aggregate(finished).map_err(|e| tracker.fail(e))?;

        tracker.enter(ForecastPhase::Done);
        tracing::info!("Finished {} forecast: {}", strategy.label(), question.title);
        Ok(forecast)
    }

    async fn single_run<S: RunStrategy>(
        &self,
        index: usize,
        prompt: &str,
        strategy: &S,
        context: &S::Context,
    ) -> Result<RunResult> {
        let answer = self
            .client
            .call(prompt, self.model.as_deref(), self.temperature)
            .await
            .inspect_err(|e| tracing::error!("Run {} model call failed: {}", index + 1, e))?;
        strategy
            .process(context, &answer)
            .inspect_err(|e| tracing::error!("Run {} could not be processed: {}", index + 1, e))
    }
}

fn validate<S: RunStrategy>(strategy: &S, question: &Question, runs: usize) -> Result<S::Context> {
    if runs == 0 {
        return Err(ForecastError::invalid_question(
            "number of runs must be at least 1",
        ));
    }
    strategy.prepare(question)
}

/// Run one saved answer through extraction and synthesis without calling a model.
pub fn process_answer(kind: QuestionKind, question: &Question, answer: &str) -> Result<RunResult> {
    match kind {
        QuestionKind::Binary => process_offline(&binary::BinaryRun, question, answer),
        QuestionKind::MultipleChoice => {
            process_offline(&multiple_choice::MultipleChoiceRun, question, answer)
        }
        QuestionKind::Numeric | QuestionKind::Discrete => {
            process_offline(&numeric::NumericRun, question, answer)
        }
    }
}

fn process_offline<S: RunStrategy>(
    strategy: &S,
    question: &Question,
    answer: &str,
) -> Result<RunResult> {
    let context = strategy.prepare(question)?;
    strategy.process(&context, answer)
}

/// Picks the façade by question type. Numeric and discrete questions share one.
#[derive(Debug, Clone)]
pub struct Forecaster<M, R> {
    engine: ForecastEngine<M, R>,
}

impl<M: ModelClient, R: ResearchProvider> Forecaster<M, R> {
    pub fn new(client: M, research: R) -> Self {
        Self::from_engine(ForecastEngine::new(client, research))
    }

    pub fn from_engine(engine: ForecastEngine<M, R>) -> Self {
        Self { engine }
    }

    pub async fn forecast(
        &self,
        question: &Question,
        runs: usize,
    ) -> Result<(QuestionKind, AggregatedForecast)> {
        let forecast = match question.kind {
            QuestionKind::Binary => {
                self.engine
                    .run(question, runs, &binary::BinaryRun)
                    .await?
            }
            QuestionKind::MultipleChoice => {
                self.engine
                    .run(question, runs, &multiple_choice::MultipleChoiceRun)
                    .await?
            }
            QuestionKind::Numeric | QuestionKind::Discrete => {
                self.engine
                    .run(question, runs, &numeric::NumericRun)
                    .await?
            }
        };
        Ok((question.kind, forecast))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ModelError;
    use crate::research::NoResearch;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingModel {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelClient for CountingModel {
        async fn call(
            &self,
            _prompt: &str,
            _model: Option<&str>,
            _temperature: Option<f32>,
        ) -> std::result::Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("Probability: 40%".to_string())
        }
    }

    fn binary_question() -> Question {
        Question::from_json(r#"{"title": "Will it rain?", "type": "binary"}"#).unwrap()
    }

    #[tokio::test]
    async fn validation_failures_end_in_failed_phase() {
        let engine = ForecastEngine::new(CountingModel::default(), NoResearch);
        let question = binary_question();

        let mut tracker = PhaseTracker::new(&question.title);
        let err = engine
            .run_tracked(&question, 1, &multiple_choice::MultipleChoiceRun, &mut tracker)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidQuestionError");
        assert_eq!(tracker.phase, ForecastPhase::Failed);

        let mut tracker = PhaseTracker::new(&question.title);
        let err = engine
            .run_tracked(&question, 0, &binary::BinaryRun, &mut tracker)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidQuestionError");
        assert_eq!(tracker.phase, ForecastPhase::Failed);

        assert_eq!(engine.client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_forecast_ends_in_done_phase() {
        let engine = ForecastEngine::new(CountingModel::default(), NoResearch);
        let question = binary_question();

        let mut tracker = PhaseTracker::new(&question.title);
        let forecast = engine
            .run_tracked(&question, 2, &binary::BinaryRun, &mut tracker)
            .await
            .unwrap();
        assert_eq!(forecast.distribution.as_binary(), Some(0.4));
        assert_eq!(tracker.phase, ForecastPhase::Done);
        assert_eq!(engine.client.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failure_records_phase() {
        let mut tracker = PhaseTracker::new("q");
        tracker.enter(ForecastPhase::Running);
        let err = tracker.fail(ForecastError::NoRuns);
        assert_eq!(tracker.phase, ForecastPhase::Failed);
        assert!(matches!(err, ForecastError::NoRuns));
        assert_eq!(ForecastPhase::Aggregating.to_string(), "aggregating");
    }
}
