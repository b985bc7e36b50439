//! Forecast synthesis: turn free-text model answers into calibrated probability
//! distributions and fold repeated runs into one forecast per question.

pub mod aggregate;
pub mod clients;
pub mod config;
pub mod deserializers;
pub mod distribution;
pub mod error;
pub mod extractors;
pub mod forecaster;
pub mod prompts;
pub mod question;
pub mod research;
pub mod submission;

pub use aggregate::{AggregatedForecast, RunResult};
pub use error::{ForecastError, Result};
pub use forecaster::{
    BinaryForecaster, ForecastEngine, ForecastPhase, Forecaster, MultipleChoiceForecaster,
    NumericForecaster,
};
pub use question::{Question, QuestionKind};
