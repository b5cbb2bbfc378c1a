//! Window sample and derived statistics types.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped observation held in the rolling window.
///
/// `is_newest` is a presentation marker owned by the window store: it is
/// recomputed on every window mutation and is true only for the last sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// ISO-8601 timestamp as delivered by the source (or receipt time).
    pub timestamp: String,
    /// Domain value after remapping.
    pub value: f64,
    /// True only for the most recently appended sample.
    #[serde(default)]
    pub is_newest: bool,
}

impl Sample {
    /// Create a sample with an explicit timestamp.
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
            is_newest: false,
        }
    }

    /// Create a sample stamped with the current UTC time.
    pub fn received_now(value: f64) -> Self {
        Self::new(now_timestamp(), value)
    }
}

/// Current UTC time as an RFC 3339 string with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Average, minimum and maximum over the current window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl WindowStats {
    /// Compute stats over a sequence of values.
    ///
    /// Returns `None` for an empty input.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0usize;
        let mut mean = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in values {
            count += 1;
            // Divide before subtracting so finite inputs near f64::MAX stay finite
            let n = count as f64;
            mean += v / n - mean / n;
            min = min.min(v);
            max = max.max(v);
        }

        if count == 0 {
            return None;
        }

        Some(Self {
            avg: mean.max(min).min(max),
            min,
            max,
        })
    }
}
