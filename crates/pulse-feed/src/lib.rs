//! Frame decoding and windowed aggregation for the pulse stream.
//!
//! Turns inbound text frames into samples and keeps the derived view of
//! the stream consistent:
//! - `StreamFrame`: Initial batch vs incremental point, decoded explicitly
//! - `RollingWindow`: Bounded FIFO window of samples
//! - `StatsAggregator`: avg/min/max over the window
//! - `Reading`: Latest value, delta, zone and status line

pub mod error;
pub mod parser;
pub mod reading;
pub mod stats;
pub mod window;

pub use error::{FeedError, FeedResult};
pub use parser::{FeedUpdate, FrameDecoder, RawPoint, StreamFrame};
pub use reading::Reading;
pub use stats::{EmptyWindowPolicy, StatsAggregator};
pub use window::{RollingWindow, DEFAULT_WINDOW_CAPACITY};
