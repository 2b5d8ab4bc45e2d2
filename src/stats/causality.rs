//! Granger causality via nested OLS regressions and the SSR F-test

use super::distribution::f_survival;
use super::regression::{ols, OlsFit, StatsError};
use super::stationarity::{StationarityOutcome, Verdict};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum CausalityError {
    NotStationary { series: String, verdict: Verdict },
    LengthMismatch { effect: usize, cause: usize },
    Misaligned { index: usize, effect: i64, cause: i64 },
    InsufficientObservations { len: usize, required: usize },
    Degenerate { lag: usize },
    Regression(StatsError),
}

impl std::fmt::Display for CausalityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CausalityError::NotStationary { series, verdict } => write!(
                f,
                "Series '{}' is not stationary ({})",
                series,
                verdict.as_str()
            ),
            CausalityError::LengthMismatch { effect, cause } => write!(
                f,
                "Series lengths differ: effect {}, cause {}",
                effect, cause
            ),
            CausalityError::Misaligned {
                index,
                effect,
                cause,
            } => write!(
                f,
                "Series are not co-indexed at {}: effect ts {}, cause ts {}",
                index, effect, cause
            ),
            CausalityError::InsufficientObservations { len, required } => write!(
                f,
                "Insufficient observations: {} (need more than {})",
                len, required
            ),
            CausalityError::Degenerate { lag } => {
                write!(f, "Unrestricted regression has zero residual at lag {}", lag)
            }
            CausalityError::Regression(e) => write!(f, "Regression error: {}", e),
        }
    }
}

impl std::error::Error for CausalityError {}

impl From<StatsError> for CausalityError {
    fn from(err: StatsError) -> Self {
        CausalityError::Regression(err)
    }
}

/// SSR-based F-test for one lag length
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LagTest {
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_num: usize,
    pub df_denom: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CausalityResult {
    pub cause: String,
    pub effect: String,
    pub lags: BTreeMap<usize, LagTest>,
}

impl CausalityResult {
    pub fn p_values(&self) -> BTreeMap<usize, f64> {
        self.lags.iter().map(|(lag, t)| (*lag, t.p_value)).collect()
    }

    /// `"1 (0.1234), 2 (0.0456)"`
    pub fn summary(&self) -> String {
        self.lags
            .iter()
            .map(|(lag, t)| format!("{} ({:.4})", lag, t.p_value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub struct CausalityTester {
    pub max_lag: usize,
}

impl Default for CausalityTester {
    fn default() -> Self {
        Self { max_lag: 5 }
    }
}

impl CausalityTester {
    pub fn new(max_lag: usize) -> Self {
        Self { max_lag }
    }

    /// Test whether `cause` Granger-causes `effect`
    ///
    /// # Arguments
    /// * `effect` - Stationary outcome of the series being predicted
    /// * `cause` - Stationary outcome of the candidate cause, co-indexed with `effect`
    ///
    /// # Returns
    /// Per-lag F-test results for lags `1..=max_lag`, no thresholding applied
    pub fn test(
        &self,
        effect: &StationarityOutcome,
        cause: &StationarityOutcome,
    ) -> Result<CausalityResult, CausalityError> {
        for outcome in [effect, cause] {
            if !outcome.is_stationary() {
                return Err(CausalityError::NotStationary {
                    series: outcome.series.name.clone(),
                    verdict: outcome.verdict,
                });
            }
        }

        let (e, c) = (&effect.series, &cause.series);
        if e.len() != c.len() {
            return Err(CausalityError::LengthMismatch {
                effect: e.len(),
                cause: c.len(),
            });
        }
        if let Some((index, (a, b))) = e
            .points()
            .iter()
            .zip(c.points())
            .enumerate()
            .find(|(_, (a, b))| a.0 != b.0)
        {
            return Err(CausalityError::Misaligned {
                index,
                effect: a.0,
                cause: b.0,
            });
        }

        let required = 3 * self.max_lag + 1;
        if e.len() <= required {
            return Err(CausalityError::InsufficientObservations {
                len: e.len(),
                required,
            });
        }

        let y = e.values();
        let x = c.values();
        let mut lags = BTreeMap::new();
        for lag in 1..=self.max_lag {
            lags.insert(lag, self.lag_test(&y, &x, lag)?);
        }

        log::debug!("Granger {} → {}: {}", c.name, e.name, summarize(&lags));

        Ok(CausalityResult {
            cause: c.name.clone(),
            effect: e.name.clone(),
            lags,
        })
    }

    fn lag_test(&self, y: &[f64], x: &[f64], lag: usize) -> Result<LagTest, CausalityError> {
        let nobs = y.len() - lag;
        let response = y[lag..].to_vec();

        let lagged = |series: &[f64], k: usize| series[lag - k..lag - k + nobs].to_vec();

        let mut columns = vec![vec![1.0; nobs]];
        columns.extend((1..=lag).map(|k| lagged(y, k)));
        let restricted = ols(&response, &columns)?;

        columns.extend((1..=lag).map(|k| lagged(x, k)));
        let unrestricted = ols(&response, &columns)?;

        f_test(&restricted, &unrestricted, lag)
    }
}

fn f_test(restricted: &OlsFit, unrestricted: &OlsFit, lag: usize) -> Result<LagTest, CausalityError> {
    if unrestricted.is_perfect_fit() {
        return Err(CausalityError::Degenerate { lag });
    }
    let df_denom = unrestricted.df_resid();
    let f_statistic =
        ((restricted.ssr - unrestricted.ssr).max(0.0) / lag as f64) / (unrestricted.ssr / df_denom as f64);

    Ok(LagTest {
        f_statistic,
        p_value: f_survival(f_statistic, lag as f64, df_denom as f64),
        df_num: lag,
        df_denom,
    })
}

fn summarize(lags: &BTreeMap<usize, LagTest>) -> String {
    lags.iter()
        .map(|(lag, t)| format!("{}:{:.4}", lag, t.p_value))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::series::TimeSeries;

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 11) as f64 / (1u64 << 53) as f64) - 0.5
            })
            .collect()
    }

    fn outcome(name: &str, values: &[f64], verdict: Verdict) -> StationarityOutcome {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as i64 * 300, *v))
            .collect();
        StationarityOutcome {
            verdict,
            series: TimeSeries::new(name, points).unwrap(),
            order: 0,
            p_values: vec![0.01],
        }
    }

    #[test]
    fn test_non_stationary_input_fails() {
        let values = noise(50, 1);
        let effect = outcome("close", &values, Verdict::Stationary);
        let cause = outcome("MCS", &values, Verdict::NonStationary);

        let err = CausalityTester::default().test(&effect, &cause).unwrap_err();
        assert!(matches!(err, CausalityError::NotStationary { ref series, .. } if series == "MCS"));
    }

    #[test]
    fn test_precondition_errors() {
        let tester = CausalityTester::default();
        let a = outcome("a", &noise(50, 1), Verdict::Stationary);
        let short = outcome("b", &noise(49, 2), Verdict::Stationary);
        assert!(matches!(
            tester.test(&a, &short),
            Err(CausalityError::LengthMismatch { effect: 50, cause: 49 })
        ));

        let tiny_a = outcome("a", &noise(16, 1), Verdict::Stationary);
        let tiny_b = outcome("b", &noise(16, 2), Verdict::Stationary);
        assert!(matches!(
            tester.test(&tiny_a, &tiny_b),
            Err(CausalityError::InsufficientObservations { len: 16, required: 16 })
        ));

        let mut shifted = outcome("b", &noise(50, 2), Verdict::Stationary);
        let points = shifted.series.points().iter().map(|(ts, v)| (ts + 1, *v)).collect();
        shifted.series = TimeSeries::new("b", points).unwrap();
        assert!(matches!(
            tester.test(&a, &shifted),
            Err(CausalityError::Misaligned { index: 0, .. })
        ));
    }

    #[test]
    fn test_detects_lagged_driver() {
        // effect[t] = 0.9 * cause[t-1] + small noise
        let cause = noise(120, 3);
        let jitter = noise(120, 4);
        let effect: Vec<f64> = (0..120)
            .map(|t| if t == 0 { jitter[0] } else { 0.9 * cause[t - 1] + 0.05 * jitter[t] })
            .collect();

        let tester = CausalityTester::new(3);
        let forward = tester
            .test(
                &outcome("effect", &effect, Verdict::Stationary),
                &outcome("cause", &cause, Verdict::Stationary),
            )
            .unwrap();

        assert_eq!(forward.lags.len(), 3);
        assert!(forward.p_values().values().all(|p| *p < 1e-6));
        assert_eq!(forward.lags[&2].df_num, 2);
        // 117 observations minus 1 + 2 * 3 regressors
        assert_eq!(forward.lags[&3].df_denom, 110);
    }

    #[test]
    fn test_independent_series_are_not_flagged_everywhere() {
        let tester = CausalityTester::new(2);
        let result = tester
            .test(
                &outcome("a", &noise(200, 5), Verdict::Stationary),
                &outcome("b", &noise(200, 6), Verdict::Stationary),
            )
            .unwrap();
        assert!(result.p_values().values().all(|p| (0.0..=1.0).contains(p)));
        assert!(result.p_values().values().any(|p| *p > 0.01));
    }

    #[test]
    fn test_summary_format() {
        let mut lags = BTreeMap::new();
        for (lag, p) in [(1, 0.12344), (2, 0.0456)] {
            lags.insert(
                lag,
                LagTest {
                    f_statistic: 1.0,
                    p_value: p,
                    df_num: lag,
                    df_denom: 20,
                },
            );
        }
        let result = CausalityResult {
            cause: "MCS".into(),
            effect: "close".into(),
            lags,
        };
        assert_eq!(result.summary(), "1 (0.1234), 2 (0.0456)");
    }
}
