//! Folding N independent runs into one forecast and one audit document.
//!
//! Binary probabilities and CDFs aggregate by median (elementwise for CDFs);
//! categorical distributions aggregate by per-option arithmetic mean. Every
//! aggregation is commutative, so only the rationale section order depends on the
//! order runs were launched in.

use std::collections::BTreeMap;

use crate::distribution::{CategoricalDistribution, ProbabilityDistribution};
use crate::error::{ForecastError, Result};

const CDF_PREVIEW_CHARS: usize = 100;

/// One completed run: its distribution and the rationale that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub distribution: ProbabilityDistribution,
    pub rationale: String,
}

/// Final answer for one question plus the combined rationale document
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedForecast {
    pub distribution: ProbabilityDistribution,
    pub rationale: String,
}

/// Median with the conventional average of the two middle values for even counts.
pub fn median(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(ForecastError::NoRuns);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

pub fn aggregate_binary(runs: Vec<RunResult>) -> Result<AggregatedForecast> {
    let probabilities = runs
        .iter()
        .map(|run| {
            run.distribution
                .as_binary()
                .ok_or_else(|| variant_mismatch("binary"))
        })
        .collect::<Result<Vec<f64>>>()?;

    let probability = median(&probabilities)?;
    let header = format!("Median Probability: {:.2}%", probability * 100.0);
    Ok(AggregatedForecast {
        distribution: ProbabilityDistribution::Binary(probability),
        rationale: combine_rationales(&header, &runs),
    })
}

pub fn aggregate_categorical(runs: Vec<RunResult>) -> Result<AggregatedForecast> {
    let distributions = runs
        .iter()
        .map(|run| {
            run.distribution
                .as_categorical()
                .ok_or_else(|| variant_mismatch("categorical"))
        })
        .collect::<Result<Vec<&CategoricalDistribution>>>()?;

    let Some(first) = distributions.first() else {
        return Err(ForecastError::NoRuns);
    };

    let mut sums = vec![0.0; first.len()];
    for dist in &distributions {
        if dist.len() != first.len() {
            return Err(ForecastError::ShapeMismatch {
                expected: first.len(),
                actual: dist.len(),
            });
        }
        if !dist.labels().eq(first.labels()) {
            return Err(ForecastError::LabelMismatch {
                expected: first.labels().map(str::to_string).collect(),
                actual: dist.labels().map(str::to_string).collect(),
            });
        }
        for (sum, p) in sums.iter_mut().zip(dist.probabilities()) {
            *sum += p;
        }
    }

    let count = distributions.len() as f64;
    let averaged = CategoricalDistribution::from_entries(
        first
            .labels()
            .map(str::to_string)
            .zip(sums.into_iter().map(|s| s / count))
            .collect(),
    );

    let header = format!(
        "Average Probability Yes Per Category: `{}`",
        serde_json::to_string(&averaged)?
    );
    Ok(AggregatedForecast {
        distribution: ProbabilityDistribution::Categorical(averaged),
        rationale: combine_rationales(&header, &runs),
    })
}

pub fn aggregate_cdf(runs: Vec<RunResult>) -> Result<AggregatedForecast> {
    let cdfs = runs
        .iter()
        .map(|run| run.distribution.as_cdf().ok_or_else(|| variant_mismatch("cdf")))
        .collect::<Result<Vec<&[f64]>>>()?;

    let Some(first) = cdfs.first() else {
        return Err(ForecastError::NoRuns);
    };
    if let Some(other) = cdfs.iter().find(|cdf| cdf.len() != first.len()) {
        return Err(ForecastError::ShapeMismatch {
            expected: first.len(),
            actual: other.len(),
        });
    }

    let mut column = Vec::with_capacity(cdfs.len());
    let mut median_cdf = Vec::with_capacity(first.len());
    for i in 0..first.len() {
        column.clear();
        column.extend(cdfs.iter().map(|cdf| cdf[i]));
        median_cdf.push(median(&column)?);
    }

    // Elementwise medians of monotone CDFs can dip; reported, not repaired.
    if median_cdf.windows(2).any(|w| w[1] < w[0]) {
        tracing::warn!("Aggregated CDF is not monotonic; submitting as computed");
    }

    let preview: String = format!("{:?}", median_cdf)
        .chars()
        .take(CDF_PREVIEW_CHARS)
        .collect();
    let header = format!("Median CDF: `{}...`", preview);
    Ok(AggregatedForecast {
        distribution: ProbabilityDistribution::Cdf(median_cdf),
        rationale: combine_rationales(&header, &runs),
    })
}

pub fn binary_run_rationale(probability: f64, answer: &str) -> String {
    run_rationale(
        &format!("Extracted Probability: {:.2}%", probability * 100.0),
        answer,
    )
}

pub fn option_run_rationale(scores: &[f64], answer: &str) -> String {
    run_rationale(&format!("Extracted Option Scores: {:?}", scores), answer)
}

pub fn percentile_run_rationale(percentiles: &BTreeMap<u32, f64>, answer: &str) -> String {
    run_rationale(
        &format!("Extracted Percentile Values: {:?}", percentiles),
        answer,
    )
}

fn run_rationale(signal: &str, answer: &str) -> String {
    format!("{signal}\n\nModel's Answer: {answer}\n\n\n")
}

fn combine_rationales(header: &str, runs: &[RunResult]) -> String {
    let sections: Vec<String> = runs
        .iter()
        .enumerate()
        .map(|(i, run)| format!("## Rationale {}\n{}", i + 1, run.rationale))
        .collect();
    format!("{header}\n\n{}", sections.join("\n\n"))
}

fn variant_mismatch(expected: &str) -> ForecastError {
    ForecastError::Internal {
        message: format!("expected {expected} run results"),
    }
}
