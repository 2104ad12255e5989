// State publication module
//
// This module provides the StateManager which holds the latest WidgetState
// snapshot behind Arc<RwLock<T>> and emits change events for the view layer.

use crate::models::{Direction, WidgetState};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;

/// Change events emitted when the published snapshot changes
///
/// The view layer listens to these instead of polling the widget.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The level moved one step
    LevelChanged { level: u32, previous: u32 },

    /// Direction changed (including to and from idle)
    DirectionChanged { direction: Direction },

    /// An animation began from idle
    AnimationStarted { direction: Direction },

    /// An animation ended and the widget is idle again
    AnimationFinished { level: u32 },

    /// Target was updated
    TargetChanged { target: u32 },

    /// Step delay was updated
    DelayChanged { delay: Duration },

    /// Snapshot was reset to its initial values
    StateReset,
}

/// Holds the latest widget snapshot and broadcasts what changed
///
/// The widget runtime is the only writer: after every processed event it
/// calls [`publish()`](Self::publish) with a fresh snapshot. Readers use
/// [`snapshot()`](Self::snapshot), [`read()`](Self::read) or
/// [`subscribe()`](Self::subscribe).
pub struct StateManager {
    state: Arc<RwLock<WidgetState>>,
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// The broadcast channel buffers 100 events.
    pub fn new() -> Self {
        Self::with_state(WidgetState::default())
    }

    pub fn with_state(state: WidgetState) -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(state)),
            state_tx,
        }
    }

    /// Clone of the current snapshot
    pub fn snapshot(&self) -> WidgetState {
        self.read(WidgetState::clone)
    }

    /// Execute a function with read access to the snapshot
    ///
    /// # Example
    /// ```ignore
    /// let level = state_manager.read(|state| state.level);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&WidgetState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Mutate the snapshot and emit change events
    ///
    /// Captures the old snapshot, applies `update_fn`, diffs the two and sends
    /// one event per detected change.
    ///
    /// # Returns
    /// The events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut WidgetState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);
        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Replace the snapshot wholesale
    pub fn publish(&self, snapshot: WidgetState) -> Vec<StateChange> {
        self.update(|state| *state = snapshot)
    }

    /// Reset to `initial` and emit a [`StateChange::StateReset`] after the diff events
    pub fn reset(&self, initial: WidgetState) -> Vec<StateChange> {
        let mut changes = self.publish(initial);

        let reset_event = StateChange::StateReset;
        let _ = self.state_tx.send(reset_event.clone());
        changes.push(reset_event);

        changes
    }

    /// Subscribe to future change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &WidgetState, new: &WidgetState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.level != new.level {
            changes.push(StateChange::LevelChanged {
                level: new.level,
                previous: old.level,
            });
        }

        if old.direction != new.direction {
            changes.push(StateChange::DirectionChanged {
                direction: new.direction,
            });

            if old.direction.is_idle() {
                changes.push(StateChange::AnimationStarted {
                    direction: new.direction,
                });
            } else if new.direction.is_idle() {
                changes.push(StateChange::AnimationFinished { level: new.level });
            }
        }

        if old.target != new.target {
            changes.push(StateChange::TargetChanged { target: new.target });
        }

        if old.delay != new.delay {
            changes.push(StateChange::DelayChanged { delay: new.delay });
        }

        changes
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the same snapshot and channel
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
