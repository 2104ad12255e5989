use crate::metrics::Metrics;
use crate::models::{AnimationRequest, Direction, LevelCounter, WidgetSettings, WidgetState};
use crate::services::render::{self, Segment};
use crate::services::scheduler::{StepHandle, StepScheduler, VirtualScheduler};
use std::sync::Arc;
use std::time::Duration;

/// Whether an animation is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Animating,
}

/// Outcome of feeding one event into a [`DirectionController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Request for the direction already in flight; nothing changed.
    Redundant,
    /// A stop condition held, no step was taken and the controller is idle.
    Stopped { level: u32 },
    /// One step taken, the next one is scheduled.
    Stepped { level: u32, next: StepHandle },
    /// Final step onto the target while draining; the controller is idle.
    Landed { level: u32 },
    /// Firing for a step that is no longer live. Ignored.
    Stale,
}

impl Transition {
    /// True when this transition left the controller idle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Transition::Stopped { .. } | Transition::Landed { .. })
    }

    /// Level reached by a step, if one was taken.
    pub fn stepped_to(&self) -> Option<u32> {
        match self {
            Transition::Stepped { level, .. } | Transition::Landed { level } => Some(*level),
            _ => None,
        }
    }
}

/// Direction-driven stepping state machine.
///
/// Owns the [`LevelCounter`], the current [`AnimationRequest`] and the one
/// live step timer. Every event (a direction request or a timer firing)
/// re-reads this state, checks the stop conditions first and only then moves
/// the level:
///
/// - Increasing stops once `level >= target`
/// - Decreasing stops once `level == 0`
/// - Decreasing with `level - 1 == target` takes one last step onto the
///   target and stops there
///
/// A request for the opposite direction cancels the live timer before
/// anything else happens, so a step from the abandoned direction can never
/// land afterwards. Invariant: a step is pending iff the direction is not
/// `None`.
pub struct DirectionController<S: StepScheduler> {
    counter: LevelCounter,
    request: AnimationRequest,
    pending: Option<StepHandle>,
    scheduler: S,
    metrics: Arc<Metrics>,
}

impl<S: StepScheduler> DirectionController<S> {
    /// Build an idle controller from validated settings.
    pub fn new(scheduler: S, settings: &WidgetSettings) -> Self {
        let counter = LevelCounter::with_level(
            settings.max_capacity,
            settings.initial_level,
            settings.target,
        );
        Self::with_counter(scheduler, counter, settings.delay)
    }

    pub fn with_counter(scheduler: S, counter: LevelCounter, delay: Duration) -> Self {
        Self {
            counter,
            request: AnimationRequest {
                direction: Direction::None,
                delay,
            },
            pending: None,
            scheduler,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Share a metrics instance with the caller.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Ask the level to move in `direction`.
    ///
    /// While idle this evaluates immediately, taking the first step right
    /// away. While animating the same way it does nothing. While animating
    /// the other way it cancels the live step and starts over from the
    /// current level. `Direction::None` is not a request and is ignored.
    pub fn request_direction(&mut self, direction: Direction) -> Transition {
        self.metrics.record_request();

        if direction.is_idle() || direction == self.request.direction {
            tracing::debug!(
                "Redundant request {:?} (in flight: {})",
                direction,
                self.request.direction
            );
            self.metrics.record_redundant_request();
            return Transition::Redundant;
        }

        if let Some(handle) = self.pending.take() {
            tracing::info!(
                "Direction switch {} -> {} at level {}, cancelling {}",
                self.request.direction,
                direction,
                self.counter.current(),
                handle
            );
            self.scheduler.cancel(handle);
            self.metrics.record_timer_cancelled();
            self.metrics.record_direction_switch();
        }

        self.request.direction = direction;
        let transition = self.evaluate();

        match transition {
            Transition::Stopped { level } => {
                tracing::debug!("Request {} ignored at level {}", direction, level);
                self.metrics.record_ignored_request();
            }
            Transition::Landed { .. } => self.metrics.record_animation_completed(),
            _ => {}
        }
        transition
    }

    /// Handle a firing of `handle`. Anything but the live step is ignored.
    pub fn on_step_fired(&mut self, handle: StepHandle) -> Transition {
        if self.pending != Some(handle) {
            tracing::trace!("Ignoring stale {}", handle);
            self.metrics.record_stale_firing();
            return Transition::Stale;
        }
        self.pending = None;

        let transition = self.evaluate();
        if transition.is_terminal() {
            tracing::info!(
                "Animation finished at level {} (target {})",
                self.counter.current(),
                self.counter.target()
            );
            self.metrics.record_animation_completed();
        }
        transition
    }

    /// Change the target. Takes effect at the next evaluation; the value is
    /// clamped into `[0, max_capacity]`.
    pub fn set_target(&mut self, target: u32) -> u32 {
        let stored = self.counter.set_target(target);
        tracing::debug!("Target set to {} (requested {})", stored, target);
        stored
    }

    /// Change the pause between steps. A step already pending keeps its
    /// original deadline. `delay` must be greater than zero.
    pub fn set_delay(&mut self, delay: Duration) {
        tracing::debug!("Delay set to {:?}", delay);
        self.request.delay = delay;
    }

    /// Stop whatever is in flight without touching the level.
    ///
    /// Returns true if an animation was running.
    pub fn halt(&mut self) -> bool {
        let was_animating = !self.request.direction.is_idle();
        self.finish();
        was_animating
    }

    /// Stop whatever is in flight and return to the level, target and delay
    /// in `settings`.
    pub fn reset(&mut self, settings: &WidgetSettings) {
        self.finish();
        self.counter = LevelCounter::with_level(
            settings.max_capacity,
            settings.initial_level,
            settings.target,
        );
        self.request.delay = settings.delay;
        tracing::info!(
            "Reset to level {} (target {})",
            self.counter.current(),
            self.counter.target()
        );
    }

    pub fn current_direction(&self) -> Direction {
        self.request.direction
    }

    pub fn current_level(&self) -> u32 {
        self.counter.current()
    }

    pub fn target(&self) -> u32 {
        self.counter.target()
    }

    pub fn delay(&self) -> Duration {
        self.request.delay
    }

    pub fn rendered_segments(&self) -> Vec<Segment> {
        render::project(self.counter.current())
    }

    pub fn phase(&self) -> Phase {
        if self.pending.is_some() {
            Phase::Animating
        } else {
            Phase::Idle
        }
    }

    /// The live step, if any.
    pub fn pending_step(&self) -> Option<StepHandle> {
        self.pending
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn snapshot(&self) -> WidgetState {
        WidgetState {
            level: self.counter.current(),
            max_capacity: self.counter.max_capacity(),
            target: self.counter.target(),
            direction: self.request.direction,
            delay: self.request.delay,
        }
    }

    // Stop conditions are checked before the level moves, never after.
    fn evaluate(&mut self) -> Transition {
        let direction = self.request.direction;
        let level = self.counter.current();
        let target = self.counter.target();

        let stop = match direction {
            Direction::None => true,
            Direction::Increasing => level >= target,
            Direction::Decreasing => self.counter.is_empty(),
        };
        if stop {
            self.finish();
            return Transition::Stopped { level };
        }

        // Draining from above: land on the target instead of passing it.
        if direction == Direction::Decreasing && level - 1 == target {
            self.step(direction);
            self.finish();
            return Transition::Landed {
                level: self.counter.current(),
            };
        }

        self.step(direction);
        let next = self.scheduler.schedule(self.request.delay);
        self.metrics.record_timer_scheduled();
        self.pending = Some(next);

        Transition::Stepped {
            level: self.counter.current(),
            next,
        }
    }

    fn step(&mut self, direction: Direction) {
        if self.counter.step(direction) {
            self.metrics.record_step();
            tracing::trace!("Level {} ({})", self.counter.current(), direction);
        }
    }

    fn finish(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
            self.metrics.record_timer_cancelled();
        }
        self.request.direction = Direction::None;
    }
}

impl DirectionController<VirtualScheduler> {
    /// Idle controller on a fresh virtual clock.
    pub fn virtual_clock(settings: &WidgetSettings) -> Self {
        Self::new(VirtualScheduler::new(), settings)
    }

    /// Let `elapsed` virtual time pass, processing every firing due within it.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<Transition> {
        let deadline = self.scheduler.now() + elapsed;
        let mut transitions = Vec::new();
        while let Some(handle) = self.scheduler.fire_next_until(deadline) {
            transitions.push(self.on_step_fired(handle));
        }
        self.scheduler.advance_clock_to(deadline);
        transitions
    }

    /// Process firings until the animation stops.
    pub fn run_to_completion(&mut self) -> Vec<Transition> {
        let mut transitions = Vec::new();
        while let Some(handle) = self.scheduler.fire_next() {
            transitions.push(self.on_step_fired(handle));
        }
        transitions
    }
}
