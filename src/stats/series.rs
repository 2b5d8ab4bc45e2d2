//! Named, strictly time-ordered numeric series

use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesError {
    NotIncreasing { index: usize, previous: i64, current: i64 },
    NonFinite { index: usize },
}

impl std::fmt::Display for SeriesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesError::NotIncreasing {
                index,
                previous,
                current,
            } => write!(
                f,
                "Timestamps must strictly increase: index {} has {} after {}",
                index, current, previous
            ),
            SeriesError::NonFinite { index } => write!(f, "Non-finite value at index {}", index),
        }
    }
}

impl std::error::Error for SeriesError {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub name: String,
    points: Vec<(i64, f64)>,
}

impl TimeSeries {
    /// Validate and wrap `(timestamp, value)` points
    pub fn new(name: impl Into<String>, points: Vec<(i64, f64)>) -> Result<Self, SeriesError> {
        for (index, window) in points.windows(2).enumerate() {
            if window[1].0 <= window[0].0 {
                return Err(SeriesError::NotIncreasing {
                    index: index + 1,
                    previous: window[0].0,
                    current: window[1].0,
                });
            }
        }
        if let Some(index) = points.iter().position(|(_, v)| !v.is_finite()) {
            return Err(SeriesError::NonFinite { index });
        }
        Ok(Self {
            name: name.into(),
            points,
        })
    }

    /// Sort by timestamp, keep the last value for duplicate timestamps, drop non-finite values
    pub fn from_unordered(name: impl Into<String>, mut points: Vec<(i64, f64)>) -> Self {
        points.retain(|(_, v)| v.is_finite());
        points.sort_by_key(|(ts, _)| *ts);

        let mut deduped: Vec<(i64, f64)> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.0 == point.0 => *last = point,
                _ => deduped.push(point),
            }
        }

        Self {
            name: name.into(),
            points: deduped,
        }
    }

    pub fn points(&self) -> &[(i64, f64)] {
        &self.points
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.points.iter().map(|(ts, _)| *ts).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `value[t] - value[t-1]`, stamped with the later timestamp; the first point is dropped
    pub fn difference(&self) -> TimeSeries {
        TimeSeries {
            name: self.name.clone(),
            points: self
                .points
                .windows(2)
                .map(|w| (w[1].0, w[1].1 - w[0].1))
                .collect(),
        }
    }

    /// Exact-timestamp inner join: both returned series keep only shared timestamps
    pub fn inner_join(&self, other: &TimeSeries) -> (TimeSeries, TimeSeries) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < self.points.len() && j < other.points.len() {
            let (ts_a, va) = self.points[i];
            let (ts_b, vb) = other.points[j];
            if ts_a == ts_b {
                left.push((ts_a, va));
                right.push((ts_b, vb));
                i += 1;
                j += 1;
            } else if ts_a < ts_b {
                i += 1;
            } else {
                j += 1;
            }
        }

        (
            TimeSeries {
                name: self.name.clone(),
                points: left,
            },
            TimeSeries {
                name: other.name.clone(),
                points: right,
            },
        )
    }

    /// True when both series carry exactly the same timestamps
    pub fn is_coindexed_with(&self, other: &TimeSeries) -> bool {
        self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .zip(&other.points)
                .all(|(a, b)| a.0 == b.0)
    }
}
