// UI module - runtime task and console front end
//
// This module contains:
// - WidgetRuntime/WidgetHandle: Owns the controller on a tokio task and accepts commands
// - console: Line-oriented driver that renders the tub as text

pub mod console;
pub mod runtime;

pub use console::{CommandParser, ConsoleCommand, render_tub, run_console};
pub use runtime::{WidgetCommand, WidgetHandle, WidgetRuntime};
