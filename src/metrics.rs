// Animation metrics
//
// Lightweight counters for what the widget did over its lifetime

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters shared between a controller, its runtime and whoever wants to
/// log them.
///
/// Uses atomic operations so a [`WidgetHandle`](crate::ui::WidgetHandle) can
/// read them while the runtime task keeps writing.
#[derive(Debug)]
pub struct Metrics {
    /// Direction requests received (including redundant and ignored ones)
    pub direction_requests: AtomicU64,

    /// Requests for the direction already in flight
    pub redundant_requests: AtomicU64,

    /// Requests that hit a stop condition before any step was taken
    pub ignored_requests: AtomicU64,

    /// Requests that reversed an animation in flight
    pub direction_switches: AtomicU64,

    /// Level changes performed
    pub steps_taken: AtomicU64,

    /// Step timers scheduled
    pub timers_scheduled: AtomicU64,

    /// Step timers cancelled before firing
    pub timers_cancelled: AtomicU64,

    /// Firings that arrived for a step that was no longer live
    pub stale_firings: AtomicU64,

    /// Animations that ran to their stop condition
    pub animations_completed: AtomicU64,

    /// State change events published to subscribers
    pub state_broadcasts: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            direction_requests: AtomicU64::new(0),
            redundant_requests: AtomicU64::new(0),
            ignored_requests: AtomicU64::new(0),
            direction_switches: AtomicU64::new(0),
            steps_taken: AtomicU64::new(0),
            timers_scheduled: AtomicU64::new(0),
            timers_cancelled: AtomicU64::new(0),
            stale_firings: AtomicU64::new(0),
            animations_completed: AtomicU64::new(0),
            state_broadcasts: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.direction_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_redundant_request(&self) {
        self.redundant_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored_request(&self) {
        self.ignored_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_direction_switch(&self) {
        self.direction_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_step(&self) {
        self.steps_taken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timer_scheduled(&self) {
        self.timers_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timer_cancelled(&self) {
        self.timers_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_firing(&self) {
        self.stale_firings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_animation_completed(&self) {
        self.animations_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_state_broadcasts(&self, count: usize) {
        self.state_broadcasts.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn steps(&self) -> u64 {
        self.steps_taken.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Animation Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Requests: {} total, {} redundant, {} ignored, {} switches",
            self.direction_requests.load(Ordering::Relaxed),
            self.redundant_requests.load(Ordering::Relaxed),
            self.ignored_requests.load(Ordering::Relaxed),
            self.direction_switches.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Steps: {}, animations completed: {}",
            self.steps(),
            self.animations_completed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Timers: {} scheduled, {} cancelled, {} stale firings",
            self.timers_scheduled.load(Ordering::Relaxed),
            self.timers_cancelled.load(Ordering::Relaxed),
            self.stale_firings.load(Ordering::Relaxed)
        );
        tracing::info!(
            "State broadcasts: {}",
            self.state_broadcasts.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
