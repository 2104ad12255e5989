//! Data models for the bathtub widget.
//!
//! - [`LevelCounter`]: current level, capacity and target
//! - [`Direction`] / [`AnimationRequest`]: what the user asked for and how fast
//! - [`WidgetState`]: snapshot published to the view layer
//! - [`WidgetConfig`] / [`WidgetSettings`]: `Bathtub.yaml` contents and their validated form

pub mod config;
pub mod level;
pub mod widget_state;

pub use self::config::{WidgetConfig, WidgetSettings};
pub use level::{
    AnimationRequest, DEFAULT_DELAY, DEFAULT_TARGET, Direction, LevelCounter, MAX_CAPACITY,
};
pub use widget_state::WidgetState;
