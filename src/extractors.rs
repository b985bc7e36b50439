//! Extraction of structured numeric signals from free-text model answers.
//!
//! Every extractor follows a "last mention wins" policy: forecasting prompts ask the
//! model to reason first and state its final answer last, so earlier numbers in the
//! text are treated as reasoning noise.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::distribution::{OptionScores, PercentileMap};
use crate::error::{ForecastError, Result};

static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)%").expect("percent regex should compile"));

/// Unsigned number with optional thousands separators and decimals
static UNSIGNED_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+(?:,\d{3})*(?:\.\d+)?").expect("number regex should compile")
});

static SIGNED_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-?\d+(?:,\d{3})*(?:\.\d+)?").expect("signed number regex should compile")
});

const PREVIEW_CHARS: usize = 200;

/// Extract the final stated probability percentage, clamped to [1, 99].
pub fn extract_binary_probability(text: &str) -> Result<u8> {
    let Some(last) = PERCENT_RE.captures_iter(text).last() else {
        tracing::error!("Could not extract probability from: {}", preview(text));
        return Err(ForecastError::extraction(
            "no percentage found in model answer",
        ));
    };

    // Digit runs that overflow u64 are absurdly large percentages; saturate them.
    let number = last[1].parse::<u64>().unwrap_or(u64::MAX);
    let percent = number.clamp(1, 99) as u8;
    tracing::debug!("Extracted probability: {}%", percent);
    Ok(percent)
}

/// Extract `percentile -> value` pairs from lines mentioning "percentile".
pub fn extract_percentiles(text: &str) -> Result<PercentileMap> {
    let mut percentiles = PercentileMap::new();

    for line in text.lines() {
        if !line.to_lowercase().contains("percentile") {
            continue;
        }

        let numbers: Vec<f64> = UNSIGNED_NUMBER_RE
            .find_iter(line)
            .filter_map(|m| parse_number(m.as_str()))
            .collect();
        if numbers.len() < 2 {
            continue;
        }

        let key = numbers[0];
        if !(0.0..=100.0).contains(&key) {
            tracing::debug!("Skipping percentile line with key {} outside [0, 100]", key);
            continue;
        }

        let mut value = numbers[numbers.len() - 1];
        let value_segment = line.split_once(':').map_or(line, |(_, rest)| rest);
        if value_segment.contains('-') {
            value = -value.abs();
        }

        percentiles.insert(key as u32, value);
    }

    if percentiles.is_empty() {
        tracing::error!("Could not extract percentiles from: {}", preview(text));
        return Err(ForecastError::extraction(
            "no percentile lines found in model answer",
        ));
    }

    tracing::debug!("Extracted {} percentiles", percentiles.len());
    Ok(percentiles)
}

/// Extract the last `option_count` per-line scores, in document order.
pub fn extract_option_scores(text: &str, option_count: usize) -> Result<OptionScores> {
    if option_count == 0 {
        return Err(ForecastError::extraction("no options to extract scores for"));
    }

    let scores: Vec<f64> = text
        .lines()
        .filter_map(|line| SIGNED_NUMBER_RE.find_iter(line).last())
        .filter_map(|m| parse_number(m.as_str()))
        .collect();

    if scores.len() < option_count {
        tracing::error!(
            "Could not extract {} option scores from: {}",
            option_count,
            preview(text)
        );
        return Err(ForecastError::extraction(format!(
            "expected {} option scores, found {} numeric lines",
            option_count,
            scores.len()
        )));
    }

    let extracted = scores[scores.len() - option_count..].to_vec();
    tracing::debug!("Extracted {} option scores", extracted.len());
    Ok(extracted)
}

fn parse_number(token: &str) -> Option<f64> {
    token.replace(',', "").parse::<f64>().ok()
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_takes_last_percentage() {
        let text = "Base rate is 20%, news pushes it up.\nFinal answer: Probability: 73%";
        assert_eq!(extract_binary_probability(text).unwrap(), 73);
    }

    #[test]
    fn binary_clamps_extremes() {
        assert_eq!(extract_binary_probability("Probability: 0%").unwrap(), 1);
        assert_eq!(extract_binary_probability("Probability: 100%").unwrap(), 99);
        assert_eq!(
            extract_binary_probability("Probability: 99999999999999999999999%").unwrap(),
            99
        );
    }

    #[test]
    fn binary_without_percent_fails() {
        let err = extract_binary_probability("I think it is likely.").unwrap_err();
        assert_eq!(err.kind(), "ExtractionError");
    }

    #[test]
    fn percentiles_parse_separators_and_decimals() {
        let text = "Reasoning first.\nPercentile 10: 1,200\nPercentile 50: 3,450.5\npercentile 90: 10,000";
        let p = extract_percentiles(text).unwrap();
        assert_eq!(p.get(&10), Some(&1200.0));
        assert_eq!(p.get(&50), Some(&3450.5));
        assert_eq!(p.get(&90), Some(&10000.0));
    }

    #[test]
    fn percentiles_force_negative_after_colon() {
        let p = extract_percentiles("Percentile 20: -35").unwrap();
        assert_eq!(p.get(&20), Some(&-35.0));
    }

    #[test]
    fn percentile_lines_with_one_number_are_skipped() {
        let text = "Percentile estimates follow, 1 per line\nPercentile 40: 7";
        let p = extract_percentiles(text).unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p.get(&40), Some(&7.0));
        let text = "The percentiles are below\nPercentile: 40";
        assert!(extract_percentiles(text).is_err());
    }

    #[test]
    fn option_scores_keep_last_lines() {
        let text = "Considering 3 options.\nA: 20\nB: 30\nC: 50\nFinal:\nA: 10\nB: 10\nC: 80";
        assert_eq!(extract_option_scores(text, 3).unwrap(), vec![10.0, 10.0, 80.0]);
    }

    #[test]
    fn percentile_keys_outside_range_are_skipped() {
        let p = extract_percentiles("Percentile 150: 3\nPercentile 90: 12").unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p.get(&90), Some(&12.0));
        assert!(extract_percentiles("Percentile 150: 3").is_err());
    }

    #[test]
    fn repeated_percentile_key_keeps_later_line() {
        let text = "Percentile 50: 10\nOn reflection:\nPercentile 50: 14";
        let p = extract_percentiles(text).unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p.get(&50), Some(&14.0));
    }

    #[test]
    fn minus_without_colon_negates_value() {
        let p = extract_percentiles("10th percentile -5").unwrap();
        assert_eq!(p.get(&10), Some(&-5.0));
    }

    #[test]
    fn option_scores_keep_sign_and_separators() {
        let text = "A: 2,500\nB: 300.5\nC: -1,200";
        assert_eq!(
            extract_option_scores(text, 3).unwrap(),
            vec![2500.0, 300.5, -1200.0]
        );
    }

    #[test]
    fn option_scores_zero_count_fails() {
        assert!(extract_option_scores("A: 1", 0).is_err());
    }
}
