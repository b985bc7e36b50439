//! Probability objects synthesized from extracted model signals.
//!
//! The extractors hand over raw numbers; this module turns them into well-formed
//! distributions that the submission side accepts without further transforms.

pub mod categorical;
pub mod cdf;

use std::collections::BTreeMap;

use serde::Serialize;

pub use categorical::{CategoricalDistribution, normalize_option_scores};
pub use cdf::{CONTINUOUS_CDF_SIZE, CdfSpec, synthesize_cdf};

/// Percentile (0-100) to stated value
pub type PercentileMap = BTreeMap<u32, f64>;

/// Raw per-option scores, positionally aligned with the question's option labels
pub type OptionScores = Vec<f64>;

/// Lowest and highest probability any single outcome may carry
pub const MIN_PROBABILITY: f64 = 0.01;
pub const MAX_PROBABILITY: f64 = 0.99;

/// Synthesized, validated forecast in one of the three submission shapes.
///
/// Serializes untagged: a float, a label-to-float object, or a float array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProbabilityDistribution {
    Binary(f64),
    Categorical(CategoricalDistribution),
    Cdf(Vec<f64>),
}

impl ProbabilityDistribution {
    pub fn as_binary(&self) -> Option<f64> {
        match self {
            ProbabilityDistribution::Binary(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&CategoricalDistribution> {
        match self {
            ProbabilityDistribution::Categorical(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_cdf(&self) -> Option<&[f64]> {
        match self {
            ProbabilityDistribution::Cdf(cdf) => Some(cdf),
            _ => None,
        }
    }
}

/// Convert an extracted percentage in [1, 99] to a probability.
pub fn binary_probability(percent: u8) -> f64 {
    f64::from(percent) / 100.0
}
