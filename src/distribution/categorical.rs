use serde::ser::{Serialize, SerializeMap, Serializer};

use super::{MAX_PROBABILITY, MIN_PROBABILITY};
use crate::error::{ForecastError, Result};

/// Option label to probability, kept in the question's option order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoricalDistribution {
    entries: Vec<(String, f64)>,
}

impl CategoricalDistribution {
    pub fn from_entries(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn probabilities(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, p)| *p)
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.probabilities().sum()
    }
}

// Serialized as a JSON object whose keys follow option order.
impl Serialize for CategoricalDistribution {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, probability) in &self.entries {
            map.serialize_entry(label, probability)?;
        }
        map.end()
    }
}

/// Normalize raw option scores into a clamped simplex mapped onto `labels`.
///
/// Scores are divided by their sum, clamped to [0.01, 0.99], renormalized, and the
/// remaining floating-point drift is added to the last option so the same input
/// always rounds the same way.
pub fn normalize_option_scores(
    labels: &[String],
    scores: &[f64],
) -> Result<CategoricalDistribution> {
    if labels.len() != scores.len() {
        return Err(ForecastError::ShapeMismatch {
            expected: labels.len(),
            actual: scores.len(),
        });
    }
    if scores.is_empty() {
        return Err(ForecastError::normalization("no option scores to normalize"));
    }
    if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(ForecastError::normalization(format!(
            "non-finite option score {bad}"
        )));
    }

    let total: f64 = scores.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return Err(ForecastError::normalization(format!(
            "option scores sum to {total}"
        )));
    }

    let clamped: Vec<f64> = scores
        .iter()
        .map(|s| (s / total).clamp(MIN_PROBABILITY, MAX_PROBABILITY))
        .collect();
    let clamped_total: f64 = clamped.iter().sum();
    let mut normalized: Vec<f64> = clamped.iter().map(|p| p / clamped_total).collect();

    let drift = 1.0 - normalized.iter().sum::<f64>();
    if let Some(last) = normalized.last_mut() {
        *last += drift;
    }

    Ok(CategoricalDistribution::from_entries(
        labels.iter().cloned().zip(normalized).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalizes_percent_scores() {
        let dist = normalize_option_scores(&labels(&["A", "B", "C"]), &[10.0, 10.0, 80.0]).unwrap();
        assert!((dist.get("A").unwrap() - 0.1).abs() < 1e-9);
        assert!((dist.get("B").unwrap() - 0.1).abs() < 1e-9);
        assert!((dist.get("C").unwrap() - 0.8).abs() < 1e-9);
        assert!((dist.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn clamps_dominant_option() {
        let dist = normalize_option_scores(&labels(&["A", "B"]), &[0.0, 100.0]).unwrap();
        assert!((dist.get("A").unwrap() - 0.01).abs() < 1e-9);
        assert!((dist.get("B").unwrap() - 0.99).abs() < 1e-9);
    }

    #[test]
    fn zero_sum_is_a_normalization_error() {
        let err = normalize_option_scores(&labels(&["A", "B"]), &[0.0, 0.0]).unwrap_err();
        assert_eq!(err.kind(), "NormalizationError");
    }

    #[test]
    fn non_finite_is_a_normalization_error() {
        let err = normalize_option_scores(&labels(&["A", "B"]), &[f64::NAN, 1.0]).unwrap_err();
        assert_eq!(err.kind(), "NormalizationError");
    }

    #[test]
    fn length_mismatch_is_fatal() {
        let err = normalize_option_scores(&labels(&["A", "B", "C"]), &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::ShapeMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn serializes_in_option_order() {
        let dist = CategoricalDistribution::from_entries(vec![
            ("zeta".to_string(), 0.7),
            ("alpha".to_string(), 0.3),
        ]);
        assert_eq!(
            serde_json::to_string(&dist).unwrap(),
            r#"{"zeta":0.7,"alpha":0.3}"#
        );
    }
}
