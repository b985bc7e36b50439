//! forecast-synth command line.
//!
//! Usage:
//!   forecast-synth forecast questions/*.json --runs 5
//!   forecast-synth forecast q.json --backend local --no-research --output json
//!   forecast-synth extract --kind numeric --answer answer.txt --question q.json

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures_util::future::join_all;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use forecast_synth::clients::{AdmissionGate, ApiClient, ModelBackend};
use forecast_synth::config::{self, BackendKind, Config, RuntimeConfig};
use forecast_synth::distribution::ProbabilityDistribution;
use forecast_synth::forecaster::{ForecastEngine, Forecaster, process_answer};
use forecast_synth::research::{LlmResearchProvider, NoResearch, ResearchProvider};
use forecast_synth::submission::ForecastPayload;
use forecast_synth::{ForecastError, Question, QuestionKind};

#[derive(Parser)]
#[command(name = "forecast-synth")]
#[command(about = "Synthesize probabilistic forecasts from repeated model runs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast every question file concurrently
    Forecast {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Runs per question (defaults to num_runs_per_question)
        #[arg(long)]
        runs: Option<usize>,
        #[arg(long, value_enum)]
        backend: Option<BackendKind>,
        /// Skip the research step
        #[arg(long)]
        no_research: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        output: OutputFormat,
    },
    /// Extract and synthesize a saved model answer without calling a model
    Extract {
        #[arg(long, value_enum)]
        kind: ExtractKind,
        #[arg(long)]
        answer: PathBuf,
        #[arg(long)]
        question: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExtractKind {
    Binary,
    MultipleChoice,
    Numeric,
}

impl From<ExtractKind> for QuestionKind {
    fn from(kind: ExtractKind) -> Self {
        match kind {
            ExtractKind::Binary => QuestionKind::Binary,
            ExtractKind::MultipleChoice => QuestionKind::MultipleChoice,
            ExtractKind::Numeric => QuestionKind::Numeric,
        }
    }
}

#[derive(Serialize)]
struct QuestionReport<'a> {
    file: &'a Path,
    question_type: QuestionKind,
    forecast: ForecastPayload,
    rationale: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    config::load_env_file();
    init_logging(&RuntimeConfig::load_from_env().log_level);

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Forecast {
            files,
            runs,
            backend,
            no_research,
            output,
        } => forecast(&config, &files, runs, backend, no_research, output).await,
        Commands::Extract {
            kind,
            answer,
            question,
        } => extract(kind, &answer, &question),
    }
}

fn init_logging(filter: &str) {
    let env_filter =
        EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("forecast_synth=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn forecast(
    config: &Config,
    files: &[PathBuf],
    runs: Option<usize>,
    backend: Option<BackendKind>,
    no_research: bool,
    output: OutputFormat,
) -> Result<()> {
    let runs = runs.unwrap_or(config.bot.num_runs_per_question);
    let backend = backend.unwrap_or(config.bot.forecast_backend);

    let gate = AdmissionGate::new(config.bot.concurrent_requests_limit);
    let client = ModelBackend::from_config(config, backend, gate.clone())
        .with_context(|| format!("failed to build {backend:?} model backend"))?;
    let research = research_provider(config, no_research, gate);
    let forecaster = Forecaster::from_engine(ForecastEngine::new(client, research));

    tracing::info!(
        "Forecasting {} question(s), {} run(s) each, backend {:?}, concurrency {}",
        files.len(),
        runs,
        backend,
        config.bot.concurrent_requests_limit
    );

    let outcomes = join_all(files.iter().map(|path| {
        let forecaster = &forecaster;
        async move {
            let question = read_question(path)?;
            let (kind, forecast) = forecaster.forecast(&question, runs).await?;
            Ok::<_, ForecastError>((question, kind, forecast))
        }
    }))
    .await;

    let mut failed = 0usize;
    for (path, outcome) in files.iter().zip(outcomes) {
        match outcome {
            Ok((question, kind, forecast)) => match output {
                OutputFormat::Summary => {
                    println!(
                        "{} [{}] {}: {}",
                        path.display(),
                        kind,
                        question.title,
                        summarize(&forecast.distribution)
                    );
                }
                OutputFormat::Json => {
                    let report = QuestionReport {
                        file: path,
                        question_type: kind,
                        forecast: ForecastPayload::from(&forecast.distribution),
                        rationale: &forecast.rationale,
                    };
                    println!("{}", serde_json::to_string(&report)?);
                }
            },
            Err(e) => {
                failed += 1;
                eprintln!("{}: {}: {}", path.display(), e.kind(), e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} question(s) failed", failed, files.len());
    }
    Ok(())
}

/// Research runs on the hosted API. Without a key it is skipped.
fn research_provider(
    config: &Config,
    no_research: bool,
    gate: AdmissionGate,
) -> Arc<dyn ResearchProvider> {
    if no_research || !config.bot.use_research {
        return Arc::new(NoResearch);
    }
    match ApiClient::new(config, gate) {
        Ok(client) => Arc::new(LlmResearchProvider::from_config(client, config)),
        Err(e) => {
            tracing::warn!("Research disabled: {}", e);
            Arc::new(NoResearch)
        }
    }
}

fn read_question(path: &Path) -> forecast_synth::Result<Question> {
    let json = std::fs::read_to_string(path).map_err(|e| ForecastError::InvalidQuestion {
        message: format!("cannot read {}: {e}", path.display()),
    })?;
    Question::from_json(&json)
}

fn summarize(distribution: &ProbabilityDistribution) -> String {
    match distribution {
        ProbabilityDistribution::Binary(p) => format!("{:.1}% yes", p * 100.0),
        ProbabilityDistribution::Categorical(dist) => dist
            .entries()
            .iter()
            .map(|(label, p)| format!("{label}={:.1}%", p * 100.0))
            .collect::<Vec<_>>()
            .join(", "),
        ProbabilityDistribution::Cdf(cdf) => {
            let median_index = cdf.partition_point(|&p| p < 0.5);
            format!(
                "CDF with {} points, crosses 0.5 at index {}",
                cdf.len(),
                median_index
            )
        }
    }
}

fn extract(kind: ExtractKind, answer: &Path, question: &Path) -> Result<()> {
    let question = read_question(question)?;
    let answer = std::fs::read_to_string(answer)
        .with_context(|| format!("cannot read answer {}", answer.display()))?;

    let run = process_answer(kind.into(), &question, &answer)
        .map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&ForecastPayload::from(&run.distribution))?
    );
    eprintln!("{}", run.rationale);
    Ok(())
}
