//! Step timers.
//!
//! A [`StepScheduler`] arranges a single future firing and hands back a
//! [`StepHandle`] identifying it. When the delay elapses the handle is
//! delivered back to the owning controller, which re-reads its own state at
//! that moment instead of trusting anything captured at scheduling time.
//!
//! Two implementations ship with the crate:
//! - [`TokioScheduler`]: wall-clock timers, one sleeping task per handle,
//!   fired handles arrive on an mpsc channel
//! - [`VirtualScheduler`]: a manually advanced clock with a full event log,
//!   used by tests, benchmarks and anything that wants deterministic stepping

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one scheduled step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepHandle(u64);

impl StepHandle {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StepHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step#{}", self.0)
    }
}

/// Paces animation steps.
///
/// Cancelling a handle that already fired or was already cancelled is a
/// no-op. Callers keep at most one handle live and cancel it before
/// scheduling another.
#[cfg_attr(test, mockall::automock)]
pub trait StepScheduler {
    /// Arrange one firing after `delay`.
    fn schedule(&mut self, delay: Duration) -> StepHandle;

    /// Make sure `handle` never fires.
    fn cancel(&mut self, handle: StepHandle);
}

/// Wall-clock scheduler backed by tokio timers.
///
/// Each handle is a spawned task sleeping for the delay and then sending the
/// handle on the fired channel. Cancel aborts the task. A handle that was
/// already queued on the channel when it got cancelled can still be received;
/// the controller discards it because it no longer matches its live step.
pub struct TokioScheduler {
    tokio_handle: tokio::runtime::Handle,
    next_id: u64,
    timers: HashMap<StepHandle, JoinHandle<()>>,
    fired_tx: mpsc::UnboundedSender<StepHandle>,
}

impl TokioScheduler {
    /// Create the scheduler and the receiver that fired handles arrive on.
    pub fn new(tokio_handle: tokio::runtime::Handle) -> (Self, mpsc::UnboundedReceiver<StepHandle>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            tokio_handle,
            next_id: 0,
            timers: HashMap::new(),
            fired_tx,
        };
        (scheduler, fired_rx)
    }

    fn prune_finished(&mut self) {
        self.timers.retain(|_, task| !task.is_finished());
    }
}

impl StepScheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration) -> StepHandle {
        self.prune_finished();
        self.next_id += 1;
        let handle = StepHandle(self.next_id);

        let fired_tx = self.fired_tx.clone();
        let task = self.tokio_handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if fired_tx.send(handle).is_err() {
                tracing::trace!("{} fired after its receiver was dropped", handle);
            }
        });
        self.timers.insert(handle, task);

        tracing::trace!("Scheduled {} in {:?}", handle, delay);
        handle
    }

    fn cancel(&mut self, handle: StepHandle) {
        if let Some(task) = self.timers.remove(&handle) {
            task.abort();
            tracing::trace!("Cancelled {}", handle);
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.timers.drain() {
            task.abort();
        }
    }
}

/// Entry in a [`VirtualScheduler`] log. `at` is virtual time since creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Scheduled {
        handle: StepHandle,
        at: Duration,
        due: Duration,
    },
    Cancelled {
        handle: StepHandle,
        at: Duration,
    },
    Fired {
        handle: StepHandle,
        at: Duration,
    },
}

/// Deterministic scheduler driven by an explicit clock.
///
/// Nothing fires on its own; [`fire_next`](Self::fire_next) and
/// [`fire_next_until`](Self::fire_next_until) pop the earliest due timer and
/// move the clock to its deadline. Every schedule, cancel and firing is
/// recorded, and the peak number of simultaneously live timers is tracked.
#[derive(Debug, Default)]
pub struct VirtualScheduler {
    now: Duration,
    next_id: u64,
    pending: Vec<(StepHandle, Duration)>,
    peak_live: usize,
    events: Vec<TimerEvent>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn live_count(&self) -> usize {
        self.pending.len()
    }

    /// Highest number of timers that were live at the same time.
    pub fn peak_live(&self) -> usize {
        self.peak_live
    }

    pub fn events(&self) -> &[TimerEvent] {
        &self.events
    }

    /// Deadline of a live timer.
    pub fn due(&self, handle: StepHandle) -> Option<Duration> {
        self.pending
            .iter()
            .find(|(pending, _)| *pending == handle)
            .map(|(_, due)| *due)
    }

    pub fn scheduled_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, TimerEvent::Scheduled { .. }))
            .count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, TimerEvent::Cancelled { .. }))
            .count()
    }

    /// Virtual times at which timers fired, in firing order.
    pub fn fired_at(&self) -> Vec<Duration> {
        self.events
            .iter()
            .filter_map(|event| match event {
                TimerEvent::Fired { at, .. } => Some(*at),
                _ => None,
            })
            .collect()
    }

    /// Fire the earliest live timer regardless of how far away it is.
    pub fn fire_next(&mut self) -> Option<StepHandle> {
        self.fire_next_until(Duration::MAX)
    }

    /// Fire the earliest live timer if it is due at or before `deadline`.
    /// Ties are broken by scheduling order.
    pub fn fire_next_until(&mut self, deadline: Duration) -> Option<StepHandle> {
        let (index, handle, due) = self
            .pending
            .iter()
            .enumerate()
            .map(|(index, (handle, due))| (index, *handle, *due))
            .min_by_key(|(_, handle, due)| (*due, *handle))?;
        if due > deadline {
            return None;
        }

        self.pending.remove(index);
        self.now = self.now.max(due);
        self.events.push(TimerEvent::Fired {
            handle,
            at: self.now,
        });
        Some(handle)
    }

    /// Move the clock forward without firing anything.
    pub fn advance_clock_to(&mut self, instant: Duration) {
        self.now = self.now.max(instant);
    }
}

impl StepScheduler for VirtualScheduler {
    fn schedule(&mut self, delay: Duration) -> StepHandle {
        self.next_id += 1;
        let handle = StepHandle(self.next_id);
        let due = self.now + delay;

        self.pending.push((handle, due));
        self.peak_live = self.peak_live.max(self.pending.len());
        self.events.push(TimerEvent::Scheduled {
            handle,
            at: self.now,
            due,
        });
        handle
    }

    fn cancel(&mut self, handle: StepHandle) {
        if let Some(index) = self.pending.iter().position(|(pending, _)| *pending == handle) {
            self.pending.remove(index);
            self.events.push(TimerEvent::Cancelled {
                handle,
                at: self.now,
            });
        }
    }
}
