//! Ordinary least squares via the sweep operator
//!
//! The design is passed as columns. Columns whose residual sum of squares collapses
//! relative to their raw sum of squares are treated as collinear: they get a zero
//! coefficient, no standard error, and do not count towards the rank.

const COLLINEARITY_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq)]
pub enum StatsError {
    EmptyDesign,
    LengthMismatch { expected: usize, found: usize },
    NoDegreesOfFreedom { nobs: usize, rank: usize },
    TooShort { len: usize, required: usize },
}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::EmptyDesign => write!(f, "Regression needs at least one observation and one regressor"),
            StatsError::LengthMismatch { expected, found } => write!(
                f,
                "Regressor length mismatch: expected {}, found {}",
                expected, found
            ),
            StatsError::NoDegreesOfFreedom { nobs, rank } => write!(
                f,
                "No residual degrees of freedom: {} observations, rank {}",
                nobs, rank
            ),
            StatsError::TooShort { len, required } => write!(
                f,
                "Series too short: {} observations, {} required",
                len, required
            ),
        }
    }
}

impl std::error::Error for StatsError {}

#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<Option<f64>>,
    pub ssr: f64,
    /// Total (uncentered) sum of squares of the response
    pub tss: f64,
    pub nobs: usize,
    pub rank: usize,
}

impl OlsFit {
    pub fn df_resid(&self) -> usize {
        self.nobs - self.rank
    }

    /// Coefficient over its standard error, `None` for dropped columns
    pub fn t_value(&self, column: usize) -> Option<f64> {
        let se = self.std_errors.get(column).copied().flatten()?;
        let coef = self.coefficients[column];
        if se > 0.0 {
            Some(coef / se)
        } else if coef == 0.0 {
            Some(0.0)
        } else {
            Some(coef.signum() * f64::INFINITY)
        }
    }

    /// Gaussian log-likelihood AIC, `-2 llf + 2 rank`
    pub fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        let llf = -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0);
        -2.0 * llf + 2.0 * self.rank as f64
    }

    /// True when the residuals vanish relative to the response
    pub fn is_perfect_fit(&self) -> bool {
        self.ssr <= f64::EPSILON * self.tss.max(f64::MIN_POSITIVE) * 1e3
    }
}

/// Fit `y ~ columns` by least squares
///
/// # Arguments
/// * `y` - Response, one value per observation
/// * `columns` - Regressors, each the same length as `y` (add a column of ones for a constant)
pub fn ols(y: &[f64], columns: &[Vec<f64>]) -> Result<OlsFit, StatsError> {
    let nobs = y.len();
    let p = columns.len();
    if nobs == 0 || p == 0 {
        return Err(StatsError::EmptyDesign);
    }
    if let Some(bad) = columns.iter().find(|c| c.len() != nobs) {
        return Err(StatsError::LengthMismatch {
            expected: nobs,
            found: bad.len(),
        });
    }

    // Augmented cross-product matrix [X'X X'y; y'X y'y]
    let dim = p + 1;
    let mut a = vec![vec![0.0; dim]; dim];
    for i in 0..p {
        for j in i..p {
            let v: f64 = columns[i].iter().zip(&columns[j]).map(|(x, z)| x * z).sum();
            a[i][j] = v;
            a[j][i] = v;
        }
        let v: f64 = columns[i].iter().zip(y).map(|(x, z)| x * z).sum();
        a[i][p] = v;
        a[p][i] = v;
    }
    a[p][p] = y.iter().map(|v| v * v).sum();
    let tss = a[p][p];

    let original_diag: Vec<f64> = (0..p).map(|k| a[k][k]).collect();
    let mut swept = vec![false; p];

    for k in 0..p {
        let pivot = a[k][k];
        if original_diag[k] <= 0.0 || pivot <= COLLINEARITY_TOLERANCE * original_diag[k] {
            continue;
        }
        sweep(&mut a, k);
        swept[k] = true;
    }

    let rank = swept.iter().filter(|s| **s).count();
    if nobs <= rank {
        return Err(StatsError::NoDegreesOfFreedom { nobs, rank });
    }

    let ssr = a[p][p].max(0.0);
    let sigma2 = ssr / (nobs - rank) as f64;

    let coefficients = (0..p).map(|j| if swept[j] { a[j][p] } else { 0.0 }).collect();
    let std_errors = (0..p)
        .map(|j| swept[j].then(|| (sigma2 * a[j][j].max(0.0)).sqrt()))
        .collect();

    Ok(OlsFit {
        coefficients,
        std_errors,
        ssr,
        tss,
        nobs,
        rank,
    })
}

/// Goodnight sweep on pivot `k`
fn sweep(a: &mut [Vec<f64>], k: usize) {
    let dim = a.len();
    let d = a[k][k];

    for j in 0..dim {
        a[k][j] /= d;
    }
    for i in 0..dim {
        if i == k {
            continue;
        }
        let b = a[i][k];
        for j in 0..dim {
            a[i][j] -= b * a[k][j];
        }
        a[i][k] = -b / d;
    }
    a[k][k] = 1.0 / d;
}
