//! Differencing a series until the unit-root test rejects
//!
//! ```text
//! order 0 ──ADF──> p ≤ threshold? ──yes──> Stationary(order 0)
//!                       │no
//!                       ▼
//! order 1 = diff ──ADF──> ...          up to max_order, then NonStationary
//! ```

use super::adf::AdfTest;
use super::series::TimeSeries;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Stationary,
    NonStationary,
    InsufficientData,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Stationary => "stationary",
            Verdict::NonStationary => "non_stationary",
            Verdict::InsufficientData => "insufficient_data",
        }
    }
}

/// Result of resolving one series
///
/// `p_values[k]` is the test p-value at differencing order `k`. For `Stationary` and
/// `NonStationary` there are `order + 1` entries; for `InsufficientData` the order that
/// was too short was never tested, so there are `order` entries.
#[derive(Debug, Clone, Serialize)]
pub struct StationarityOutcome {
    pub verdict: Verdict,
    pub series: TimeSeries,
    pub order: usize,
    pub p_values: Vec<f64>,
}

impl StationarityOutcome {
    pub fn is_stationary(&self) -> bool {
        self.verdict == Verdict::Stationary
    }
}

pub struct StationarityResolver {
    pub max_order: usize,
    pub threshold: f64,
    pub test: AdfTest,
}

impl Default for StationarityResolver {
    fn default() -> Self {
        Self {
            max_order: 2,
            threshold: 0.05,
            test: AdfTest::default(),
        }
    }
}

impl StationarityResolver {
    pub fn new(max_order: usize, threshold: f64, test: AdfTest) -> Self {
        Self {
            max_order,
            threshold,
            test,
        }
    }

    /// Difference `series` until stationary or `max_order` is exhausted
    pub fn resolve(&self, series: &TimeSeries) -> StationarityOutcome {
        let mut current = series.clone();
        let mut p_values = Vec::with_capacity(self.max_order + 1);
        let mut order = 0;

        loop {
            let result = match self.test.run(&current.values()) {
                Ok(result) => result,
                Err(e) => {
                    log::debug!("'{}' at order {}: {}", current.name, order, e);
                    return StationarityOutcome {
                        verdict: Verdict::InsufficientData,
                        series: current,
                        order,
                        p_values,
                    };
                }
            };
            p_values.push(result.p_value);

            if result.p_value <= self.threshold {
                return StationarityOutcome {
                    verdict: Verdict::Stationary,
                    series: current,
                    order,
                    p_values,
                };
            }

            if order >= self.max_order {
                return StationarityOutcome {
                    verdict: Verdict::NonStationary,
                    series: current,
                    order,
                    p_values,
                };
            }

            current = current.difference();
            order += 1;
        }
    }
}
