use crate::error::WidgetError;
use crate::models::level::{DEFAULT_DELAY, DEFAULT_TARGET, MAX_CAPACITY};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Widget configuration from `Bathtub.yaml`.
///
/// Presets are kept in file order so a selector can list them the way they
/// were written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u32,

    #[serde(default = "default_target")]
    pub target: u32,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    #[serde(default)]
    pub initial_level: u32,

    /// Label → target level.
    #[serde(default = "default_target_presets")]
    pub target_presets: IndexMap<String, u32>,

    /// Label → delay in milliseconds.
    #[serde(default = "default_delay_presets")]
    pub delay_presets: IndexMap<String, u64>,

    #[serde(default)]
    pub debug_mode: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            target: default_target(),
            delay_ms: default_delay_ms(),
            initial_level: 0,
            target_presets: default_target_presets(),
            delay_presets: default_delay_presets(),
            debug_mode: false,
        }
    }
}

fn default_max_capacity() -> u32 {
    MAX_CAPACITY
}

fn default_target() -> u32 {
    DEFAULT_TARGET
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY.as_millis() as u64
}

fn default_target_presets() -> IndexMap<String, u32> {
    let mut presets = IndexMap::new();
    presets.insert("Half-way".to_string(), 5);
    presets.insert("Over your knees".to_string(), 8);
    presets.insert("Full up!".to_string(), 10);
    presets
}

fn default_delay_presets() -> IndexMap<String, u64> {
    let mut presets = IndexMap::new();
    presets.insert("1/10 second".to_string(), 100);
    presets.insert("1/2 second".to_string(), 500);
    presets.insert("1 second".to_string(), 1_000);
    presets.insert("2 seconds".to_string(), 2_000);
    presets.insert("5 seconds".to_string(), 5_000);
    presets
}

/// Validated, typed view of a [`WidgetConfig`] ready to build a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetSettings {
    pub max_capacity: u32,
    pub target: u32,
    pub delay: Duration,
    pub initial_level: u32,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            max_capacity: MAX_CAPACITY,
            target: DEFAULT_TARGET,
            delay: DEFAULT_DELAY,
            initial_level: 0,
        }
    }
}

impl WidgetConfig {
    /// Check bounds and convert to [`WidgetSettings`].
    pub fn validate(&self) -> Result<WidgetSettings, WidgetError> {
        if self.max_capacity == 0 {
            return Err(WidgetError::ZeroCapacity);
        }
        if self.target > self.max_capacity {
            return Err(WidgetError::TargetOutOfRange {
                target: self.target,
                max_capacity: self.max_capacity,
            });
        }
        if self.initial_level > self.max_capacity {
            return Err(WidgetError::LevelOutOfRange {
                level: self.initial_level,
                max_capacity: self.max_capacity,
            });
        }
        let delay = Duration::from_millis(self.delay_ms);
        if delay.is_zero() {
            return Err(WidgetError::InvalidDelay(delay));
        }

        Ok(WidgetSettings {
            max_capacity: self.max_capacity,
            target: self.target,
            delay,
            initial_level: self.initial_level,
        })
    }

    /// Resolve a target given either as a number or as a preset label
    /// (case-insensitive).
    pub fn resolve_target(&self, input: &str) -> Result<u32, WidgetError> {
        let input = input.trim();
        if let Ok(value) = input.parse::<u32>() {
            return Ok(value);
        }
        self.target_presets
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(input))
            .map(|(_, value)| *value)
            .ok_or_else(|| WidgetError::UnknownPreset(input.to_string()))
    }

    /// Look up a delay preset by label (case-insensitive).
    pub fn delay_preset(&self, label: &str) -> Option<Duration> {
        let label = label.trim();
        self.delay_presets
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(label))
            .map(|(_, ms)| Duration::from_millis(*ms))
    }

    /// Label of the target preset matching `value`, if any.
    pub fn target_label(&self, value: u32) -> Option<&str> {
        self.target_presets
            .iter()
            .find(|(_, preset)| **preset == value)
            .map(|(label, _)| label.as_str())
    }
}
