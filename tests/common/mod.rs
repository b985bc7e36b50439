//! In-memory model and research doubles shared by the integration tests

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use forecast_synth::Question;
use forecast_synth::clients::{AdmissionGate, ModelClient, ModelError};
use forecast_synth::research::ResearchProvider;

/// Answers in launch order, cycling through the script
pub struct ScriptedModel {
    answers: Vec<Result<String, String>>,
    calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(answers: &[&str]) -> Self {
        Self::with_results(answers.iter().map(|a| Ok(a.to_string())).collect())
    }

    pub fn with_results(answers: Vec<Result<String, String>>) -> Self {
        Self {
            answers,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn call(
        &self,
        prompt: &str,
        _model: Option<&str>,
        _temperature: Option<f32>,
    ) -> Result<String, ModelError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.answers[index % self.answers.len()] {
            Ok(answer) => Ok(answer.clone()),
            Err(message) => Err(ModelError::Http(message.clone())),
        }
    }
}

/// Holds a gate permit across a short sleep and records peak concurrency
pub struct GatedModel {
    gate: AdmissionGate,
    answer: String,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
}

impl GatedModel {
    pub fn new(gate: AdmissionGate, answer: &str) -> Self {
        Self {
            gate,
            answer: answer.to_string(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ModelClient for GatedModel {
    async fn call(
        &self,
        _prompt: &str,
        _model: Option<&str>,
        _temperature: Option<f32>,
    ) -> Result<String, ModelError> {
        let _permit = self.gate.acquire().await?;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

/// Returns a fixed report and counts invocations
pub struct FixedResearch {
    report: String,
    pub calls: AtomicUsize,
}

impl FixedResearch {
    pub fn new(report: &str) -> Self {
        Self {
            report: report.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ResearchProvider for FixedResearch {
    async fn conduct_research(&self, _question: &Question) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.report.clone()
    }
}

pub fn binary_question() -> Question {
    Question::from_json(
        r#"{"question": {"id": 1, "title": "Will the bill pass by June?", "type": "binary",
            "description": "A bill is pending.", "resolution_criteria": "Signed into law.",
            "fine_print": null}}"#,
    )
    .unwrap()
}

pub fn multiple_choice_question() -> Question {
    Question::from_json(
        r#"{"title": "Who wins?", "type": "multiple_choice", "options": ["A", "B", "C"]}"#,
    )
    .unwrap()
}

pub fn numeric_question() -> Question {
    Question::from_json(
        r#"{"title": "How many units?", "type": "numeric", "unit": "units",
            "open_lower_bound": false, "open_upper_bound": false,
            "scaling": {"range_min": 0, "range_max": 100, "zero_point": null}}"#,
    )
    .unwrap()
}

pub fn discrete_question(outcomes: usize) -> Question {
    Question::from_json(&format!(
        r#"{{"title": "How many launches?", "type": "discrete",
            "open_lower_bound": false, "open_upper_bound": true,
            "scaling": {{"range_min": -0.5, "range_max": 20.5, "inbound_outcome_count": {outcomes}}}}}"#
    ))
    .unwrap()
}

pub const NUMERIC_ANSWER: &str = "Reasoning...\n\
Percentile 10: 20\n\
Percentile 20: 30\n\
Percentile 40: 45\n\
Percentile 60: 55\n\
Percentile 80: 70\n\
Percentile 90: 80\n";
