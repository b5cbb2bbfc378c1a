//! Derived per-update reading: latest value, delta, zone and status.

use crate::window::RollingWindow;
use pulse_core::{StatusThresholds, Zone, ZoneTable};
use serde::Serialize;

/// What the stat displays show for the newest sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub value: f64,
    /// Value of the sample before the latest, if any.
    pub previous: Option<f64>,
    /// `value - previous`; absent until two samples exist.
    pub delta: Option<f64>,
    pub zone: Zone,
    pub status: String,
}

impl Reading {
    /// Build the reading for the newest sample. `None` on an empty window.
    pub fn from_window(
        window: &RollingWindow,
        zones: &ZoneTable,
        thresholds: &StatusThresholds,
    ) -> Option<Self> {
        let value = window.latest()?.value;
        let previous = window.previous().map(|s| s.value);
        let zone = zones.classify(value).clone();
        let status = thresholds.status_line(value, &zone);

        Some(Self {
            value,
            previous,
            delta: previous.map(|p| value - p),
            zone,
            status,
        })
    }
}
