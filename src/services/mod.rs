//! Services module - the animation core.
//!
//! Everything in here is framework-agnostic: no channels to the view layer,
//! no I/O, only the logic that decides when and how the level moves.
//!
//! # Components
//!
//! - [`DirectionController`]: the stepping state machine. Interprets direction
//!   requests, applies stop conditions before every step and cancels the live
//!   timer when the user reverses direction mid-animation.
//! - [`StepScheduler`]: the timer seam. [`TokioScheduler`] for real time,
//!   [`VirtualScheduler`] for a manually advanced clock.
//! - [`render`]: pure projection from level to drawable [`Segment`]s.
//!
//! # Usage Example
//!
//! ```
//! use bathtub::models::{Direction, WidgetSettings};
//! use bathtub::services::DirectionController;
//!
//! let mut controller = DirectionController::virtual_clock(&WidgetSettings::default());
//! controller.request_direction(Direction::Increasing); // level 1 right away
//! controller.run_to_completion();                      // ... up to the target
//! assert_eq!(controller.current_level(), 5);
//! ```

pub mod direction;
pub mod render;
pub mod scheduler;

pub use direction::{DirectionController, Phase, Transition};
pub use render::{Segment, project};
pub use scheduler::{StepHandle, StepScheduler, TimerEvent, TokioScheduler, VirtualScheduler};
