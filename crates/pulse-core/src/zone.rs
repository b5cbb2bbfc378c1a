//! Zone table and classifier.
//!
//! A zone table is an ordered set of contiguous, non-overlapping ranges.
//! Classification walks the table and returns the first zone whose upper
//! bound is at or above the value. Anything above the last bound falls
//! through to the last zone, and anything below the first bound lands in
//! the first zone, so the classifier is total over finite inputs.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// A labeled value range with a display color token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub min: f64,
    pub max: f64,
    /// Opaque color token handed to the presentation layer.
    pub color: String,
    pub label: String,
}

impl Zone {
    pub fn new(min: f64, max: f64, color: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            min,
            max,
            color: color.into(),
            label: label.into(),
        }
    }
}

/// Validated, ordered zone table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ZoneTable {
    zones: Vec<Zone>,
}

impl ZoneTable {
    /// Build a table, checking ordering and overlap.
    pub fn new(zones: Vec<Zone>) -> Result<Self> {
        if zones.is_empty() {
            return Err(CoreError::InvalidZoneTable(
                "at least one zone is required".to_string(),
            ));
        }

        for zone in &zones {
            if !zone.min.is_finite() || !zone.max.is_finite() || zone.min > zone.max {
                return Err(CoreError::InvalidZoneTable(format!(
                    "zone '{}' has invalid bounds {}..={}",
                    zone.label, zone.min, zone.max
                )));
            }
        }

        for pair in zones.windows(2) {
            if pair[1].min <= pair[0].max {
                return Err(CoreError::InvalidZoneTable(format!(
                    "zone '{}' overlaps '{}'",
                    pair[1].label, pair[0].label
                )));
            }
        }

        Ok(Self { zones })
    }

    /// Classify a value. Caller must pass a finite number.
    pub fn classify(&self, value: f64) -> &Zone {
        self.zones
            .iter()
            .find(|zone| value <= zone.max)
            .unwrap_or_else(|| self.last())
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    fn last(&self) -> &Zone {
        // Non-empty is enforced by `new`.
        &self.zones[self.zones.len() - 1]
    }
}

impl Default for ZoneTable {
    fn default() -> Self {
        Self {
            zones: vec![
                Zone::new(40.0, 60.0, "hsl(142, 76%, 36%)", "Resting"),
                Zone::new(61.0, 100.0, "hsl(221, 83%, 53%)", "Light Activity"),
                Zone::new(101.0, 140.0, "hsl(43, 96%, 56%)", "Moderate"),
                Zone::new(141.0, 170.0, "hsl(32, 95%, 44%)", "Intense"),
                Zone::new(171.0, 220.0, "hsl(0, 84%, 60%)", "Maximum"),
            ],
        }
    }
}

impl<'de> Deserialize<'de> for ZoneTable {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let zones = Vec::<Zone>::deserialize(deserializer)?;
        ZoneTable::new(zones).map_err(serde::de::Error::custom)
    }
}

/// Thresholds for the abnormal-value override in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusThresholds {
    /// Values strictly below this are reported as abnormally low.
    #[serde(default = "default_abnormal_low")]
    pub abnormal_low: f64,
    /// Values strictly above this are reported as abnormally high.
    #[serde(default = "default_abnormal_high")]
    pub abnormal_high: f64,
}

fn default_abnormal_low() -> f64 {
    40.0
}

fn default_abnormal_high() -> f64 {
    180.0
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            abnormal_low: default_abnormal_low(),
            abnormal_high: default_abnormal_high(),
        }
    }
}

impl StatusThresholds {
    /// Textual status for a value and its zone.
    pub fn status_line(&self, value: f64, zone: &Zone) -> String {
        if value < self.abnormal_low {
            "Abnormally low heart rate".to_string()
        } else if value > self.abnormal_high {
            "Abnormally high heart rate".to_string()
        } else {
            format!("{} heart rate zone", zone.label)
        }
    }
}
