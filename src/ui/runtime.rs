// WidgetRuntime - Drives a DirectionController on the tokio runtime
//
// The controller is not shared: a single task owns it together with the
// scheduler's fired-handle receiver and a command receiver. Everything else
// talks to it through a cloneable WidgetHandle:
// - Commands (direction requests, target/delay changes) go in over mpsc
// - Snapshots come out through the StateManager and its broadcast channel
//
// Timer firings are selected ahead of commands, so a step that is already due
// is applied before a command that arrived in the same instant.

use crate::error::WidgetError;
use crate::metrics::Metrics;
use crate::models::{Direction, WidgetSettings, WidgetState};
use crate::services::{DirectionController, Segment, StepHandle, TokioScheduler, Transition};
use crate::state::{StateChange, StateManager};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Commands accepted by the runtime task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetCommand {
    RequestDirection(Direction),
    SetTarget(u32),
    SetDelay(Duration),
    /// Halt and return to the settings the runtime was spawned with
    Reset,
    Shutdown,
}

/// Bounded so a flood of key presses can't grow memory without limit
const COMMAND_BUFFER: usize = 64;

/// The task that owns the controller
pub struct WidgetRuntime {
    controller: DirectionController<TokioScheduler>,
    fired_rx: mpsc::UnboundedReceiver<StepHandle>,
    command_rx: mpsc::Receiver<WidgetCommand>,
    state_manager: StateManager,
    metrics: Arc<Metrics>,
    settings: WidgetSettings,
}

impl WidgetRuntime {
    /// Spawn a runtime task for a widget built from `settings`
    ///
    /// # Arguments
    /// * `settings` - Validated widget settings
    /// * `tokio_handle` - Runtime the task and its step timers are spawned on
    ///
    /// # Returns
    /// A handle for talking to the widget and the task's JoinHandle. The task
    /// ends after [`WidgetHandle::shutdown`] or once every handle is dropped.
    pub fn spawn(
        settings: &WidgetSettings,
        tokio_handle: &tokio::runtime::Handle,
    ) -> (WidgetHandle, JoinHandle<()>) {
        let metrics = Arc::new(Metrics::new());
        let (scheduler, fired_rx) = TokioScheduler::new(tokio_handle.clone());
        let controller =
            DirectionController::new(scheduler, settings).with_metrics(Arc::clone(&metrics));

        let state_manager = StateManager::with_state(controller.snapshot());
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);

        let runtime = Self {
            controller,
            fired_rx,
            command_rx,
            state_manager: state_manager.clone(),
            metrics: Arc::clone(&metrics),
            settings: *settings,
        };

        tracing::info!(
            "Starting widget runtime: capacity={}, target={}, delay={:?}, level={}",
            settings.max_capacity,
            settings.target,
            settings.delay,
            settings.initial_level
        );
        let task = tokio_handle.spawn(runtime.run());

        let handle = WidgetHandle {
            command_tx,
            state_manager,
            metrics,
            max_capacity: settings.max_capacity,
        };
        (handle, task)
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                Some(fired) = self.fired_rx.recv() => {
                    let transition = self.controller.on_step_fired(fired);
                    tracing::trace!("{} -> {:?}", fired, transition);
                }

                command = self.command_rx.recv() => match command {
                    Some(WidgetCommand::Shutdown) => {
                        tracing::info!("Shutdown requested");
                        break;
                    }
                    Some(command) => self.apply(command),
                    None => {
                        tracing::debug!("All widget handles dropped");
                        break;
                    }
                },
            }

            self.publish();
        }

        if self.controller.halt() {
            tracing::info!(
                "Animation halted at level {}",
                self.controller.current_level()
            );
        }
        self.publish();
        self.metrics.log_summary();
        tracing::info!("Widget runtime stopped");
    }

    fn apply(&mut self, command: WidgetCommand) {
        match command {
            WidgetCommand::RequestDirection(direction) => {
                let transition = self.controller.request_direction(direction);
                if let Transition::Stopped { level } = transition {
                    tracing::debug!("{} at level {} needs no animation", direction, level);
                }
            }
            WidgetCommand::SetTarget(target) => {
                self.controller.set_target(target);
            }
            WidgetCommand::SetDelay(delay) => self.controller.set_delay(delay),
            WidgetCommand::Reset => {
                self.controller.reset(&self.settings);
                let changes = self.state_manager.reset(self.controller.snapshot());
                self.metrics.record_state_broadcasts(changes.len());
            }
            WidgetCommand::Shutdown => {}
        }
    }

    fn publish(&self) {
        let changes = self.state_manager.publish(self.controller.snapshot());
        if !changes.is_empty() {
            self.metrics.record_state_broadcasts(changes.len());
        }
    }
}

/// Cloneable front door to a running widget
///
/// Commands are validated here before they are queued, so the runtime only
/// ever sees values it can apply. Reads come from the last published snapshot
/// and may trail a command that is still queued.
#[derive(Clone)]
pub struct WidgetHandle {
    command_tx: mpsc::Sender<WidgetCommand>,
    state_manager: StateManager,
    metrics: Arc<Metrics>,
    max_capacity: u32,
}

impl WidgetHandle {
    pub async fn request_direction(&self, direction: Direction) -> Result<(), WidgetError> {
        self.send(WidgetCommand::RequestDirection(direction)).await
    }

    /// Start filling toward the target
    pub async fn increase(&self) -> Result<(), WidgetError> {
        self.request_direction(Direction::Increasing).await
    }

    /// Start draining toward the target (or empty, when already below it)
    pub async fn decrease(&self) -> Result<(), WidgetError> {
        self.request_direction(Direction::Decreasing).await
    }

    pub async fn set_target(&self, target: u32) -> Result<(), WidgetError> {
        if target > self.max_capacity {
            return Err(WidgetError::TargetOutOfRange {
                target,
                max_capacity: self.max_capacity,
            });
        }
        self.send(WidgetCommand::SetTarget(target)).await
    }

    pub async fn set_delay(&self, delay: Duration) -> Result<(), WidgetError> {
        if delay.is_zero() {
            return Err(WidgetError::InvalidDelay(delay));
        }
        self.send(WidgetCommand::SetDelay(delay)).await
    }

    /// Halt and restore the initial level, target and delay
    pub async fn reset(&self) -> Result<(), WidgetError> {
        self.send(WidgetCommand::Reset).await
    }

    /// Cancel any pending step and stop the runtime task
    pub async fn shutdown(&self) -> Result<(), WidgetError> {
        self.send(WidgetCommand::Shutdown).await
    }

    pub fn current_level(&self) -> u32 {
        self.state_manager.read(|state| state.level)
    }

    pub fn current_direction(&self) -> Direction {
        self.state_manager.read(|state| state.direction)
    }

    pub fn rendered_segments(&self) -> Vec<Segment> {
        self.state_manager.read(WidgetState::rendered_segments)
    }

    pub fn snapshot(&self) -> WidgetState {
        self.state_manager.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_manager.subscribe()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    async fn send(&self, command: WidgetCommand) -> Result<(), WidgetError> {
        tracing::debug!("Sending {:?}", command);
        self.command_tx
            .send(command)
            .await
            .map_err(|_| WidgetError::RuntimeClosed)
    }
}
