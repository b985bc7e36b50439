//! Question metadata as served by the hosting platform.
//!
//! Only the fields the synthesis engine consumes are modelled. A post document
//! (`{"question": {...}}`) and a bare question object are both accepted.

use serde::{Deserialize, Serialize};

use crate::deserializers::{de_option_f64_forgiving, null_as_default};
use crate::distribution::{CONTINUOUS_CDF_SIZE, CdfSpec};
use crate::error::{ForecastError, Result};

const UNSTATED_UNIT: &str = "Not stated (please infer this)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Binary,
    MultipleChoice,
    Numeric,
    Discrete,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Binary => "binary",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::Numeric => "numeric",
            QuestionKind::Discrete => "discrete",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, QuestionKind::Numeric | QuestionKind::Discrete)
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Range description for numeric and discrete questions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    #[serde(default, deserialize_with = "de_option_f64_forgiving")]
    pub range_min: Option<f64>,
    #[serde(default, deserialize_with = "de_option_f64_forgiving")]
    pub range_max: Option<f64>,
    #[serde(default, deserialize_with = "de_option_f64_forgiving")]
    pub zero_point: Option<f64>,
    #[serde(default)]
    pub inbound_outcome_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: Option<u64>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resolution_criteria: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fine_print: String,
    #[serde(default)]
    pub unit: Option<String>,
    /// Research field hint, when the caller has one
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub open_lower_bound: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub open_upper_bound: bool,
    #[serde(default)]
    pub scaling: Option<Scaling>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionDocument {
    Post { question: Question },
    Bare(Question),
}

impl Question {
    /// Parse either a post document or a bare question object.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: QuestionDocument = serde_json::from_str(json)?;
        Ok(match document {
            QuestionDocument::Post { question } => question,
            QuestionDocument::Bare(question) => question,
        })
    }

    pub fn unit_of_measure(&self) -> &str {
        match self.unit.as_deref() {
            Some(unit) if !unit.trim().is_empty() => unit,
            _ => UNSTATED_UNIT,
        }
    }

    /// Option labels, in the order the model is asked to score them
    pub fn option_labels(&self) -> Result<&[String]> {
        if self.kind != QuestionKind::MultipleChoice {
            return Err(ForecastError::invalid_question(format!(
                "{} question has no options",
                self.kind
            )));
        }
        if self.options.is_empty() {
            return Err(ForecastError::invalid_question(
                "multiple choice question lists no options",
            ));
        }
        Ok(&self.options)
    }

    /// CDF inputs: bounds, open flags, zero point and grid size
    pub fn cdf_spec(&self) -> Result<CdfSpec> {
        if !self.kind.is_numeric() {
            return Err(ForecastError::invalid_question(format!(
                "{} question has no numeric range",
                self.kind
            )));
        }
        let scaling = self
            .scaling
            .as_ref()
            .ok_or_else(|| ForecastError::invalid_question("numeric question has no scaling"))?;
        let lower = scaling
            .range_min
            .ok_or_else(|| ForecastError::invalid_question("scaling is missing range_min"))?;
        let upper = scaling
            .range_max
            .ok_or_else(|| ForecastError::invalid_question("scaling is missing range_max"))?;

        let cdf_size = match self.kind {
            QuestionKind::Discrete => {
                let outcomes = scaling.inbound_outcome_count.ok_or_else(|| {
                    ForecastError::invalid_question("discrete question has no inbound_outcome_count")
                })?;
                outcomes + 1
            }
            _ => CONTINUOUS_CDF_SIZE,
        };

        let spec = CdfSpec::continuous(lower, upper)
            .with_open_bounds(self.open_lower_bound, self.open_upper_bound)
            .with_zero_point(scaling.zero_point)
            .with_cdf_size(cdf_size);
        spec.validate()?;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_post_wrapper_with_nulls() {
        let json = r#"{
            "id": 7,
            "question": {
                "title": "How many?",
                "type": "discrete",
                "description": null,
                "fine_print": null,
                "open_upper_bound": true,
                "scaling": {"range_min": 0, "range_max": 20, "zero_point": null, "inbound_outcome_count": 20}
            }
        }"#;
        let q = Question::from_json(json).unwrap();
        assert_eq!(q.kind, QuestionKind::Discrete);
        assert_eq!(q.description, "");
        assert!(q.open_upper_bound);
        assert!(!q.open_lower_bound);
        let spec = q.cdf_spec().unwrap();
        assert_eq!(spec.cdf_size, 21);
        assert_eq!(spec.zero_point, None);
    }

    #[test]
    fn continuous_questions_use_201_points() {
        let json = r#"{"title": "t", "type": "numeric", "scaling": {"range_min": 1, "range_max": 1000, "zero_point": 0}}"#;
        let spec = Question::from_json(json).unwrap().cdf_spec().unwrap();
        assert_eq!(spec.cdf_size, 201);
        assert_eq!(spec.zero_point, Some(0.0));
    }

    #[test]
    fn missing_bounds_are_invalid() {
        let json = r#"{"title": "t", "type": "numeric", "scaling": {"range_min": 1}}"#;
        let err = Question::from_json(json).unwrap().cdf_spec().unwrap_err();
        assert_eq!(err.kind(), "InvalidQuestionError");
    }

    #[test]
    fn unit_falls_back_when_blank() {
        let json = r#"{"title": "t", "type": "binary", "unit": "  "}"#;
        let q = Question::from_json(json).unwrap();
        assert_eq!(q.unit_of_measure(), UNSTATED_UNIT);
    }
}
