//! Console monitor for a live pulse stream.
//!
//! Wires the stream controller to a terminal:
//! - TOML configuration with environment and CLI overrides
//! - One status line per published snapshot
//! - Keyboard controls for connect / disconnect / toggle / quit

pub mod app;
pub mod config;
pub mod console;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
