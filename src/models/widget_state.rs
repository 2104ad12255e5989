use crate::models::level::{DEFAULT_DELAY, DEFAULT_TARGET, Direction, MAX_CAPACITY};
use crate::services::render::{self, Segment};
use std::time::Duration;

/// Read-only snapshot of a widget, as seen by the view layer.
///
/// The authoritative copy lives inside the
/// [`DirectionController`](crate::services::DirectionController); this struct
/// is what gets published through [`StateManager`](crate::state::StateManager)
/// after every processed event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WidgetState {
    pub level: u32,
    pub max_capacity: u32,
    pub target: u32,
    pub direction: Direction,
    pub delay: Duration,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self {
            level: 0,
            max_capacity: MAX_CAPACITY,
            target: DEFAULT_TARGET,
            direction: Direction::None,
            delay: DEFAULT_DELAY,
        }
    }
}

impl WidgetState {
    pub fn is_animating(&self) -> bool {
        !self.direction.is_idle()
    }

    /// Segments to draw for the current level.
    pub fn rendered_segments(&self) -> Vec<Segment> {
        render::project(self.level)
    }

    /// `"Direction: up"`, `"Direction: --"` when idle.
    pub fn direction_text(&self) -> String {
        format!("Direction: {}", self.direction.label())
    }

    pub fn level_text(&self) -> String {
        format!("Level: {}", self.level)
    }

    /// Both info fields on one line.
    pub fn status_line(&self) -> String {
        format!("{}  {}", self.direction_text(), self.level_text())
    }
}
