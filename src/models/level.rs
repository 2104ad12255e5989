use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Upper bound of the tub when no configuration says otherwise ("Full up!").
pub const MAX_CAPACITY: u32 = 10;

/// Target used on startup ("Half-way").
pub const DEFAULT_TARGET: u32 = 5;

/// Pause between two animation steps on startup.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Which way the level is being animated.
///
/// `None` doubles as the idle marker: it is the initial value and the value
/// the controller falls back to whenever an animation terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    None,
    Increasing,
    Decreasing,
}

impl Direction {
    /// True when no animation is in flight.
    pub fn is_idle(self) -> bool {
        self == Direction::None
    }

    /// Short label shown next to "Direction:" in the status line.
    pub fn label(self) -> &'static str {
        match self {
            Direction::None => "--",
            Direction::Increasing => "up",
            Direction::Decreasing => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current fill level of the tub together with its bounds and target.
///
/// Invariants: `current <= max_capacity` and `target <= max_capacity`.
/// Only [`DirectionController`](crate::services::DirectionController) moves
/// `current`; everyone else reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCounter {
    current: u32,
    target: u32,
    max_capacity: u32,
}

impl LevelCounter {
    /// Empty tub with the given capacity and target (clamped).
    pub fn new(max_capacity: u32, target: u32) -> Self {
        Self::with_level(max_capacity, 0, target)
    }

    /// Tub starting at an arbitrary level. Both `current` and `target` are
    /// clamped into `[0, max_capacity]`.
    pub fn with_level(max_capacity: u32, current: u32, target: u32) -> Self {
        Self {
            current: current.min(max_capacity),
            target: target.min(max_capacity),
            max_capacity,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    /// Replace the target, clamping it into range. Returns the stored value.
    pub fn set_target(&mut self, target: u32) -> u32 {
        self.target = target.min(self.max_capacity);
        self.target
    }

    /// Move one unit in `direction`, never leaving `[0, max_capacity]`.
    ///
    /// Returns whether the level actually changed. A step at a boundary (or
    /// with `Direction::None`) is a silent no-op.
    pub(crate) fn step(&mut self, direction: Direction) -> bool {
        let next = match direction {
            Direction::None => self.current,
            Direction::Increasing => (self.current + 1).min(self.max_capacity),
            Direction::Decreasing => self.current.saturating_sub(1),
        };
        let changed = next != self.current;
        self.current = next;
        changed
    }
}

impl Default for LevelCounter {
    fn default() -> Self {
        Self::new(MAX_CAPACITY, DEFAULT_TARGET)
    }
}

/// What the user asked for: a direction and the pace to animate at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationRequest {
    pub direction: Direction,
    /// Always greater than zero.
    pub delay: Duration,
}

impl Default for AnimationRequest {
    fn default() -> Self {
        Self {
            direction: Direction::None,
            delay: DEFAULT_DELAY,
        }
    }
}
