// Bathtub - Animated water level widget
//
// This is the library crate containing the stepping state machine, its timer
// seam and the runtime that drives it. The binary crate (main.rs) provides a
// console front end.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use crate::config::ConfigManager;
pub use error::WidgetError;
pub use metrics::Metrics;
pub use models::{Direction, LevelCounter, WidgetConfig, WidgetSettings, WidgetState};
pub use services::{DirectionController, StepScheduler, Transition};
pub use state::{StateChange, StateManager};
pub use ui::{WidgetHandle, WidgetRuntime};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
