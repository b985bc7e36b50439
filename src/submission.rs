//! Submission payload in the shape the hosting platform accepts.
//!
//! Exactly one of the three fields is populated; the others serialize as `null`.

use serde::Serialize;

use crate::distribution::{CategoricalDistribution, ProbabilityDistribution};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPayload {
    pub probability_yes: Option<f64>,
    pub probability_yes_per_category: Option<CategoricalDistribution>,
    pub continuous_cdf: Option<Vec<f64>>,
}

impl From<&ProbabilityDistribution> for ForecastPayload {
    fn from(distribution: &ProbabilityDistribution) -> Self {
        let mut payload = ForecastPayload {
            probability_yes: None,
            probability_yes_per_category: None,
            continuous_cdf: None,
        };
        match distribution {
            ProbabilityDistribution::Binary(p) => payload.probability_yes = Some(*p),
            ProbabilityDistribution::Categorical(c) => {
                payload.probability_yes_per_category = Some(c.clone())
            }
            ProbabilityDistribution::Cdf(cdf) => payload.continuous_cdf = Some(cdf.clone()),
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn binary_payload_nulls_other_fields() {
        let payload = ForecastPayload::from(&ProbabilityDistribution::Binary(0.73));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "probability_yes": 0.73,
                "probability_yes_per_category": null,
                "continuous_cdf": null
            })
        );
    }

    #[test]
    fn categorical_payload_is_a_label_map() {
        let dist = CategoricalDistribution::from_entries(vec![
            ("A".to_string(), 0.25),
            ("B".to_string(), 0.75),
        ]);
        let payload = ForecastPayload::from(&ProbabilityDistribution::Categorical(dist));
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["probability_yes_per_category"], json!({"A": 0.25, "B": 0.75}));
        assert!(value["probability_yes"].is_null());
    }
}
