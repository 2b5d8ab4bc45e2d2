//! Time-series statistics: differencing to stationarity and Granger causality
//!
//! ```text
//! TimeSeries ──> StationarityResolver (ADF + differencing) ──> StationarityOutcome
//!                                                                   │
//!                      effect outcome + cause outcome ──> CausalityTester ──> CausalityResult
//! ```
//!
//! Regressions are plain OLS ([`regression::ols`]); p-values come from the
//! distributions in [`distribution`].

pub mod adf;
pub mod causality;
pub mod distribution;
pub mod regression;
pub mod series;
pub mod stationarity;

pub use adf::{AdfResult, AdfTest};
pub use causality::{CausalityError, CausalityResult, CausalityTester, LagTest};
pub use regression::{OlsFit, StatsError};
pub use series::{SeriesError, TimeSeries};
pub use stationarity::{StationarityOutcome, StationarityResolver, Verdict};
