//! Fixed interval widths used to slice the event stream

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartitionSize {
    Min5,
    Min15,
    Hour1,
}

impl PartitionSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionSize::Min5 => "5m",
            PartitionSize::Min15 => "15m",
            PartitionSize::Hour1 => "1h",
        }
    }

    pub fn duration_secs(&self) -> i64 {
        match self {
            PartitionSize::Min5 => 5 * 60,
            PartitionSize::Min15 => 15 * 60,
            PartitionSize::Hour1 => 60 * 60,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "5m" | "5min" => Some(PartitionSize::Min5),
            "15m" | "15min" => Some(PartitionSize::Min15),
            "1h" | "h" => Some(PartitionSize::Hour1),
            _ => None,
        }
    }

    pub fn all() -> [PartitionSize; 3] {
        [PartitionSize::Min5, PartitionSize::Min15, PartitionSize::Hour1]
    }

    /// Start of the interval containing `timestamp`, aligned to the epoch
    pub fn interval_start(&self, timestamp: i64) -> i64 {
        timestamp.div_euclid(self.duration_secs()) * self.duration_secs()
    }
}

impl std::fmt::Display for PartitionSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
