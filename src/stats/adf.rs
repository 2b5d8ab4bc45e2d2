//! Augmented Dickey–Fuller unit-root test (constant, AIC lag selection)
//!
//! ```text
//! Δx_t = α + γ x_{t-1} + Σ_{i=1..p} β_i Δx_{t-i} + ε_t
//!
//!   p      chosen by AIC over 0..=max_lag on a common sample, then refit
//!   stat   t-value of γ
//!   p-val  MacKinnon (1994) response surface, constant-only case
//! ```

use super::distribution::normal_cdf;
use super::regression::{ols, StatsError};

const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALLP: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGEP: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];
/// Level coefficients closer to zero than this count as zero on a perfect fit
const PERFECT_FIT_GAMMA: f64 = 1e-8;
/// Spread below this fraction of the series magnitude counts as constant
const CONSTANT_SPREAD: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct AdfResult {
    pub statistic: f64,
    pub p_value: f64,
    pub used_lag: usize,
    pub nobs: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct AdfTest {
    pub max_lag: usize,
}

impl Default for AdfTest {
    fn default() -> Self {
        Self { max_lag: 5 }
    }
}

impl AdfTest {
    pub fn new(max_lag: usize) -> Self {
        Self { max_lag }
    }

    /// Shortest series the test accepts
    pub fn min_observations(&self) -> usize {
        2 * (self.max_lag + 2)
    }

    /// Run the test on raw values
    ///
    /// # Returns
    /// `AdfResult` with the selected lag, or `StatsError` when the series is too short
    /// for the regressions.
    pub fn run(&self, x: &[f64]) -> Result<AdfResult, StatsError> {
        if x.len() < self.min_observations() {
            return Err(StatsError::TooShort {
                len: x.len(),
                required: self.min_observations(),
            });
        }

        if is_numerically_constant(x) {
            return Ok(constant_result(x.len()));
        }

        let xdiff: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        // Lag search on the sample that the largest lag allows
        let mut best: Option<(f64, usize)> = None;
        for lag in 0..=self.max_lag {
            let (y, columns) = design(x, &xdiff, lag, self.max_lag);
            let aic = ols(&y, &columns)?.aic();
            if aic.is_nan() {
                continue;
            }
            match best {
                Some((best_aic, _)) if aic >= best_aic => {}
                _ => best = Some((aic, lag)),
            }
        }
        let used_lag = best.map(|(_, lag)| lag).unwrap_or(0);

        // Refit on the widest sample for the chosen lag
        let (y, columns) = design(x, &xdiff, used_lag, used_lag);
        let fit = ols(&y, &columns)?;
        let gamma = fit.coefficients[1];

        // a dropped level column means the levels are constant up to rounding
        let Some(t_value) = fit.t_value(1) else {
            log::debug!("ADF: level column collinear, treating series as constant");
            return Ok(constant_result(x.len()));
        };

        let statistic = if fit.is_perfect_fit() {
            if gamma < -PERFECT_FIT_GAMMA {
                f64::NEG_INFINITY
            } else {
                0.0
            }
        } else {
            t_value
        };

        log::debug!(
            "ADF: stat={:.4} lag={} nobs={}",
            statistic,
            used_lag,
            fit.nobs
        );

        Ok(AdfResult {
            statistic,
            p_value: mackinnon_p(statistic),
            used_lag,
            nobs: fit.nobs,
        })
    }
}

/// Spread that vanishes next to the largest magnitude, so differenced linear series
/// with inexact slopes still count as constant
fn is_numerically_constant(x: &[f64]) -> bool {
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let scale = x.iter().fold(0.0f64, |acc, v| acc.max(v.abs())).max(1.0);
    max - min <= CONSTANT_SPREAD * scale
}

/// Zero spread is trivially stationary
fn constant_result(len: usize) -> AdfResult {
    AdfResult {
        statistic: f64::NEG_INFINITY,
        p_value: 0.0,
        used_lag: 0,
        nobs: len - 1,
    }
}

/// Response and regressors `[const, x_{t-1}, Δx_{t-1}..Δx_{t-lag}]` with the sample
/// trimmed as if `trim_lag` lags were used
fn design(x: &[f64], xdiff: &[f64], lag: usize, trim_lag: usize) -> (Vec<f64>, Vec<Vec<f64>>) {
    let nobs = xdiff.len() - trim_lag;
    let first = xdiff.len() - nobs;

    let y = xdiff[first..].to_vec();
    let mut columns = Vec::with_capacity(lag + 2);
    columns.push(vec![1.0; nobs]);
    // Δx_t = x_{t+1} - x_t, so the level preceding xdiff[t] is x[t]
    columns.push(x[first..first + nobs].to_vec());
    for i in 1..=lag {
        columns.push(xdiff[first - i..first - i + nobs].to_vec());
    }
    (y, columns)
}

/// MacKinnon approximate p-value for the constant-only ADF statistic
pub fn mackinnon_p(statistic: f64) -> f64 {
    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }
    let coefficients: &[f64] = if statistic <= TAU_STAR {
        &TAU_SMALLP
    } else {
        &TAU_LARGEP
    };
    let z = coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * statistic + c);
    normal_cdf(z)
}
