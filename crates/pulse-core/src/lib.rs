//! Core domain types for the pulse stream monitor.
//!
//! This crate provides the fundamental types shared by the feed and
//! connection layers:
//! - `Sample`: One timestamped observation in the rolling window
//! - `Zone`, `ZoneTable`: Labeled value ranges and the classifier over them
//! - `WindowStats`: Derived avg/min/max over the window
//! - `RemapPolicy`: Raw field to domain value transform

pub mod error;
pub mod remap;
pub mod types;
pub mod zone;

pub use error::{CoreError, Result};
pub use remap::RemapPolicy;
pub use types::{now_timestamp, Sample, WindowStats};
pub use zone::{StatusThresholds, Zone, ZoneTable};
