//! Pipeline configuration from environment variables and command-line flags

use crate::graph_core::{PartitionSize, DEFAULT_EXCLUDED_TAGS};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Jsonl,
    Sqlite,
}

impl BackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::Jsonl => "jsonl",
            BackendType::Sqlite => "sqlite",
        }
    }

    /// Output location used when `SOCIALFLOW_OUTPUT_PATH` is unset
    pub fn default_output_path(&self) -> &'static str {
        match self {
            BackendType::Jsonl => "data/results",
            BackendType::Sqlite => "data/results.db",
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for one analysis run
///
/// Loaded from environment variables with defaults for every value.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// SQLite database holding the `events` table
    pub events_db: PathBuf,

    /// SQLite database holding the `prices` table
    pub prices_db: PathBuf,

    /// JSONL base directory or SQLite file, depending on `backend`
    pub output_path: PathBuf,

    pub backend: BackendType,

    /// Calendar years analysed independently
    pub years: Vec<i32>,

    pub partitions: Vec<PartitionSize>,

    /// Algorithm names to run; `None` runs every registered algorithm
    pub algorithms: Option<Vec<String>>,

    /// Tags never turned into nodes (lowercase)
    pub excluded_tags: Vec<String>,

    /// Min/max-normalize each distance series
    pub normalize: bool,

    /// Maximum differencing order for stationarity
    pub max_diff_order: usize,

    /// Stationarity p-value threshold
    pub significance: f64,

    /// Maximum Granger lag (also the ADF augmentation lag)
    pub max_lag: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let backend = BackendType::Jsonl;
        Self {
            events_db: PathBuf::from("data/events.db"),
            prices_db: PathBuf::from("data/prices.db"),
            output_path: PathBuf::from(backend.default_output_path()),
            backend,
            years: vec![2018, 2022],
            partitions: PartitionSize::all().to_vec(),
            algorithms: None,
            excluded_tags: DEFAULT_EXCLUDED_TAGS.iter().map(|t| t.to_string()).collect(),
            normalize: true,
            max_diff_order: 2,
            significance: 0.05,
            max_lag: 5,
        }
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number<T: std::str::FromStr>(var: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{}={}", var, raw)))
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SOCIALFLOW_EVENTS_DB` (default: data/events.db)
    /// - `SOCIALFLOW_PRICES_DB` (default: data/prices.db)
    /// - `SOCIALFLOW_OUTPUT_PATH` (default: data/results, or data/results.db for SQLite)
    /// - `SOCIALFLOW_YEARS` (default: 2018,2022)
    /// - `SOCIALFLOW_PARTITIONS` (default: 5m,15m,1h)
    /// - `SOCIALFLOW_ALGORITHMS` (default: all)
    /// - `SOCIALFLOW_EXCLUDED_TAGS` (default: btc,bitcoin)
    /// - `SOCIALFLOW_NORMALIZE` (default: true)
    /// - `SOCIALFLOW_MAX_DIFF_ORDER` (default: 2)
    /// - `SOCIALFLOW_SIGNIFICANCE` (default: 0.05)
    /// - `SOCIALFLOW_MAX_LAG` (default: 5)
    pub fn from_env(backend: BackendType) -> Result<Self, ConfigError> {
        Self::from_lookup(backend, |var| env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup<F>(backend: BackendType, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let years = match get("SOCIALFLOW_YEARS") {
            Some(raw) => split_list(&raw)
                .map(|y| parse_number("SOCIALFLOW_YEARS", y))
                .collect::<Result<Vec<i32>, _>>()?,
            None => defaults.years,
        };

        let partitions = match get("SOCIALFLOW_PARTITIONS") {
            Some(raw) => split_list(&raw)
                .map(|p| {
                    PartitionSize::from_str(p).ok_or_else(|| {
                        ConfigError::InvalidValue(format!("SOCIALFLOW_PARTITIONS={}", p))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.partitions,
        };

        let algorithms = match get("SOCIALFLOW_ALGORITHMS") {
            Some(raw) if raw.trim().eq_ignore_ascii_case("all") => None,
            Some(raw) => Some(split_list(&raw).map(str::to_string).collect()),
            None => None,
        };

        let excluded_tags = match lookup("SOCIALFLOW_EXCLUDED_TAGS") {
            Some(raw) => split_list(&raw).map(|t| t.to_lowercase()).collect(),
            None => defaults.excluded_tags,
        };

        let normalize = match get("SOCIALFLOW_NORMALIZE") {
            Some(raw) => parse_number("SOCIALFLOW_NORMALIZE", &raw.to_lowercase())?,
            None => defaults.normalize,
        };

        let config = Self {
            events_db: get("SOCIALFLOW_EVENTS_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.events_db),
            prices_db: get("SOCIALFLOW_PRICES_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.prices_db),
            output_path: get("SOCIALFLOW_OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(backend.default_output_path())),
            backend,
            years,
            partitions,
            algorithms,
            excluded_tags,
            normalize,
            max_diff_order: match get("SOCIALFLOW_MAX_DIFF_ORDER") {
                Some(raw) => parse_number("SOCIALFLOW_MAX_DIFF_ORDER", &raw)?,
                None => defaults.max_diff_order,
            },
            significance: match get("SOCIALFLOW_SIGNIFICANCE") {
                Some(raw) => parse_number("SOCIALFLOW_SIGNIFICANCE", &raw)?,
                None => defaults.significance,
            },
            max_lag: match get("SOCIALFLOW_MAX_LAG") {
                Some(raw) => parse_number("SOCIALFLOW_MAX_LAG", &raw)?,
                None => defaults.max_lag,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse `--backend jsonl|sqlite` from the process arguments
    pub fn parse_backend_from_args() -> BackendType {
        let args: Vec<String> = env::args().collect();
        Self::backend_from_args(&args)
    }

    pub fn backend_from_args(args: &[String]) -> BackendType {
        if let Some(idx) = args.iter().position(|x| x == "--backend") {
            match args.get(idx + 1).map(|s| s.as_str()) {
                Some("sqlite") => return BackendType::Sqlite,
                Some("jsonl") => return BackendType::Jsonl,
                other => log::warn!("⚠️  Unknown --backend value {:?}, using jsonl", other),
            }
        }

        BackendType::Jsonl // Default to JSONL
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.years.is_empty() {
            return Err(ConfigError::InvalidValue("no years configured".to_string()));
        }
        if self.partitions.is_empty() {
            return Err(ConfigError::InvalidValue("no partitions configured".to_string()));
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(ConfigError::InvalidValue(format!(
                "significance must be in (0, 1), got {}",
                self.significance
            )));
        }
        if self.max_lag == 0 {
            return Err(ConfigError::InvalidValue("max lag must be at least 1".to_string()));
        }
        if matches!(&self.algorithms, Some(list) if list.is_empty()) {
            return Err(ConfigError::InvalidValue("empty algorithm list".to_string()));
        }
        Ok(())
    }
}
