//! CDF synthesis for numeric and discrete questions.
//!
//! A handful of stated percentiles is turned into a cumulative distribution sampled at
//! a fixed grid over the question's range. The grid is linear by default and
//! logarithmic when the question declares a zero point.

use super::PercentileMap;
use crate::error::{ForecastError, Result};

/// Grid length for continuous questions
pub const CONTINUOUS_CDF_SIZE: usize = 201;

/// Range, boundary policy and grid shape for one numeric question
#[derive(Debug, Clone, PartialEq)]
pub struct CdfSpec {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub open_lower_bound: bool,
    pub open_upper_bound: bool,
    /// Present for log-scaled questions
    pub zero_point: Option<f64>,
    pub cdf_size: usize,
}

impl CdfSpec {
    /// Closed, linear, continuous spec over `[lower, upper]`
    pub fn continuous(lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            lower_bound,
            upper_bound,
            open_lower_bound: false,
            open_upper_bound: false,
            zero_point: None,
            cdf_size: CONTINUOUS_CDF_SIZE,
        }
    }

    pub fn with_open_bounds(mut self, open_lower: bool, open_upper: bool) -> Self {
        self.open_lower_bound = open_lower;
        self.open_upper_bound = open_upper;
        self
    }

    pub fn with_zero_point(mut self, zero_point: Option<f64>) -> Self {
        self.zero_point = zero_point;
        self
    }

    pub fn with_cdf_size(mut self, cdf_size: usize) -> Self {
        self.cdf_size = cdf_size;
        self
    }

    pub fn range_size(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }

    /// Distance from a closed bound inside which stated values are pushed inward
    pub fn boundary_buffer(&self) -> f64 {
        let range = self.range_size();
        if range > 100.0 { 1.0 } else { 0.01 * range }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lower_bound.is_finite() || !self.upper_bound.is_finite() {
            return Err(ForecastError::invalid_question(format!(
                "bounds must be finite, got [{}, {}]",
                self.lower_bound, self.upper_bound
            )));
        }
        if self.upper_bound <= self.lower_bound {
            return Err(ForecastError::invalid_question(format!(
                "upper bound {} must exceed lower bound {}",
                self.upper_bound, self.lower_bound
            )));
        }
        if self.cdf_size < 2 {
            return Err(ForecastError::invalid_question(format!(
                "cdf size must be at least 2, got {}",
                self.cdf_size
            )));
        }
        if let Some(ratio) = self.log_ratio()
            && (!ratio.is_finite() || ratio <= 0.0 || ratio == 1.0)
        {
            return Err(ForecastError::invalid_question(format!(
                "zero point {:?} yields unusable log ratio {}",
                self.zero_point, ratio
            )));
        }
        Ok(())
    }

    fn log_ratio(&self) -> Option<f64> {
        self.zero_point
            .map(|zp| (self.upper_bound - zp) / (self.lower_bound - zp))
    }

    /// Value-domain locations of the `cdf_size` grid points
    pub fn grid(&self) -> Vec<f64> {
        let last = (self.cdf_size - 1) as f64;
        let range = self.range_size();
        let ratio = self.log_ratio();
        (0..self.cdf_size)
            .map(|i| {
                let x = i as f64 / last;
                match ratio {
                    None => self.lower_bound + range * x,
                    Some(r) => self.lower_bound + range * (r.powf(x) - 1.0) / (r - 1.0),
                }
            })
            .collect()
    }
}

/// Synthesize a CDF of length `spec.cdf_size` from stated percentiles.
pub fn synthesize_cdf(percentiles: &PercentileMap, spec: &CdfSpec) -> Result<Vec<f64>> {
    spec.validate()?;
    if percentiles.is_empty() {
        return Err(ForecastError::extraction("no percentiles to build a CDF from"));
    }
    if let Some((p, v)) = percentiles.iter().find(|(_, v)| !v.is_finite()) {
        return Err(ForecastError::normalization(format!(
            "percentile {p} has non-finite value {v}"
        )));
    }

    let points = anchored_points(percentiles, spec);
    let table = value_to_percentile_table(&points);

    let cdf: Vec<f64> = spec
        .grid()
        .into_iter()
        .map(|x| interpolate(x, &table))
        .collect();

    tracing::debug!(
        "Synthesized CDF over [{}, {}] with {} points from {} percentiles",
        spec.lower_bound,
        spec.upper_bound,
        cdf.len(),
        percentiles.len()
    );
    Ok(cdf)
}

/// Snap near-bound values and add edge anchors; returns (percentile, value) sorted
/// by percentile on the 0-100 scale.
fn anchored_points(percentiles: &PercentileMap, spec: &CdfSpec) -> Vec<(f64, f64)> {
    let buffer = spec.boundary_buffer();
    let lower = spec.lower_bound;
    let upper = spec.upper_bound;

    let mut points: Vec<(f64, f64)> = percentiles
        .iter()
        .map(|(&p, &v)| (f64::from(p), v))
        .collect();

    for (_, value) in points.iter_mut() {
        if !spec.open_lower_bound && *value <= lower + buffer {
            *value = lower + buffer;
        }
        if !spec.open_upper_bound && *value >= upper - buffer {
            *value = upper - buffer;
        }
    }

    // BTreeMap iteration order: first is the lowest percentile, last the highest.
    let (min_p, value_at_min) = points[0];
    let (max_p, value_at_max) = points[points.len() - 1];

    if spec.open_upper_bound {
        if upper > value_at_max {
            set_point(&mut points, 100.0 - 0.5 * (100.0 - max_p), upper);
        }
    } else {
        set_point(&mut points, 100.0, upper);
    }

    if spec.open_lower_bound {
        if lower < value_at_min {
            set_point(&mut points, 0.5 * min_p, lower);
        }
    } else {
        set_point(&mut points, 0.0, lower);
    }

    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

fn set_point(points: &mut Vec<(f64, f64)>, percentile: f64, value: f64) {
    match points.iter_mut().find(|(p, _)| *p == percentile) {
        Some(existing) => existing.1 = value,
        None => points.push((percentile, value)),
    }
}

/// Invert (percentile, value) into a value-sorted (value, normalized percentile) table.
/// Equal values keep the highest percentile.
fn value_to_percentile_table(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut table: Vec<(f64, f64)> = points.iter().map(|&(p, v)| (v, p / 100.0)).collect();
    // Stable: among equal values the percentile order from `points` is preserved.
    table.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut deduped: Vec<(f64, f64)> = Vec::with_capacity(table.len());
    for (value, percentile) in table {
        match deduped.last_mut() {
            Some(last) if last.0 == value => {
                tracing::warn!(
                    "Percentiles {} and {} share value {}; keeping the higher percentile",
                    last.1,
                    percentile,
                    value
                );
                last.1 = percentile;
            }
            _ => deduped.push((value, percentile)),
        }
    }
    deduped
}

/// Piecewise-linear lookup with clamping to the table's end percentiles.
fn interpolate(x: f64, table: &[(f64, f64)]) -> f64 {
    let i = table.partition_point(|(v, _)| *v < x);
    if i < table.len() && table[i].0 == x {
        return table[i].1;
    }
    if i == 0 {
        return table[0].1;
    }
    if i == table.len() {
        return table[table.len() - 1].1;
    }
    let (x0, y0) = table[i - 1];
    let (x1, y1) = table[i];
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}
