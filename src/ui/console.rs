// Console front end for the widget
//
// Reads one command per line from stdin, forwards it to a WidgetHandle and
// redraws a text tub whenever the published state changes. This is the
// headless counterpart of a graphical view: it only consumes snapshots and
// change events, never the controller itself.

use crate::error::WidgetError;
use crate::models::{Direction, WidgetConfig, WidgetState};
use crate::state::StateChange;
use crate::ui::runtime::WidgetHandle;
use anyhow::{Context, Result};
use regex::Regex;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

pub const HELP_TEXT: &str = "\
Commands:
  up | fill              fill toward the target
  down | drain           drain toward the target (or empty)
  target <n|preset>      set the target level, e.g. `target 8`, `target Full up!`
  delay <time|preset>    set the step delay, e.g. `delay 250ms`, `delay 0.5`, `delay 2s`
  status                 show the tub
  reset                  stop and go back to the configured level, target and delay
  help                   show this text
  quit                   exit";

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Direction(Direction),
    Target(u32),
    Delay(Duration),
    Reset,
    Status,
    Help,
    Quit,
}

/// Turns console lines into [`ConsoleCommand`]s
///
/// Targets and delays accept either a value or a preset label from the
/// loaded [`WidgetConfig`].
pub struct CommandParser {
    line_pattern: Regex,
    delay_pattern: Regex,
    config: WidgetConfig,
}

impl CommandParser {
    pub fn new(config: &WidgetConfig) -> Result<Self, WidgetError> {
        Ok(Self {
            line_pattern: Regex::new(r"^\s*(\S+)(?:\s+(.*?))?\s*$")?,
            delay_pattern: Regex::new(r"(?i)^(\d+(?:\.\d*)?|\.\d+)\s*(ms|s|sec|secs|seconds?)?$")?,
            config: config.clone(),
        })
    }

    pub fn parse(&self, line: &str) -> Result<ConsoleCommand, WidgetError> {
        let captures = self
            .line_pattern
            .captures(line)
            .ok_or_else(|| WidgetError::UnknownCommand(line.trim().to_string()))?;
        let verb = captures[1].to_ascii_lowercase();
        let argument = captures.get(2).map(|m| m.as_str()).unwrap_or("");

        match (verb.as_str(), argument.is_empty()) {
            ("up" | "fill" | "increase", true) => Ok(ConsoleCommand::Direction(Direction::Increasing)),
            ("down" | "drain" | "decrease", true) => {
                Ok(ConsoleCommand::Direction(Direction::Decreasing))
            }
            ("target", false) => self.config.resolve_target(argument).map(ConsoleCommand::Target),
            ("delay", false) => self.parse_delay(argument).map(ConsoleCommand::Delay),
            ("status", true) => Ok(ConsoleCommand::Status),
            ("reset", true) => Ok(ConsoleCommand::Reset),
            ("help" | "?", true) => Ok(ConsoleCommand::Help),
            ("quit" | "exit" | "q", true) => Ok(ConsoleCommand::Quit),
            _ => Err(WidgetError::UnknownCommand(line.trim().to_string())),
        }
    }

    /// Config the presets are resolved against.
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// `250ms`, `2s`, `0.5` (seconds) or a preset label such as `1/2 second`.
    fn parse_delay(&self, input: &str) -> Result<Duration, WidgetError> {
        if let Some(preset) = self.config.delay_preset(input) {
            return Ok(preset);
        }

        let captures = self
            .delay_pattern
            .captures(input)
            .ok_or_else(|| WidgetError::UnknownPreset(input.to_string()))?;
        let value: f64 = captures[1]
            .parse()
            .map_err(|_| WidgetError::UnknownPreset(input.to_string()))?;
        let seconds = match captures.get(2).map(|unit| unit.as_str().to_ascii_lowercase()) {
            Some(unit) if unit == "ms" => value / 1000.0,
            _ => value,
        };

        let delay = Duration::try_from_secs_f64(seconds)
            .map_err(|_| WidgetError::UnknownPreset(input.to_string()))?;
        if delay.is_zero() {
            return Err(WidgetError::InvalidDelay(delay));
        }
        Ok(delay)
    }
}

/// Draw the tub as text, top row first, with the status line underneath.
///
/// ```text
///  |          |
///  |~~~~~~~~~~| <- target
///  |~~~~~~~~~~|
///  \__________/
///  Direction: up  Level: 2
/// ```
pub fn render_tub(state: &WidgetState) -> String {
    const WIDTH: usize = 10;
    let water = "~".repeat(WIDTH);
    let air = " ".repeat(WIDTH);
    let mut out = String::new();

    for row in (1..=state.max_capacity).rev() {
        out.push_str(" |");
        out.push_str(if row <= state.level { &water } else { &air });
        out.push('|');
        if row == state.target {
            out.push_str(" <- target");
        }
        out.push('\n');
    }
    out.push_str(" \\");
    out.push_str(&"_".repeat(WIDTH));
    out.push_str("/\n ");
    out.push_str(&state.status_line());
    out
}

/// `"Target: 5 (Half-way)"`, or just the number when no preset matches.
pub fn target_text(config: &WidgetConfig, target: u32) -> String {
    match config.target_label(target) {
        Some(label) => format!("Target: {} ({})", target, label),
        None => format!("Target: {}", target),
    }
}

/// Run one parsed command against the widget.
///
/// # Returns
/// Text to show the user, if the command produces any
pub async fn execute(
    handle: &WidgetHandle,
    config: &WidgetConfig,
    command: ConsoleCommand,
) -> Result<Option<String>, WidgetError> {
    match command {
        ConsoleCommand::Direction(direction) => handle.request_direction(direction).await?,
        ConsoleCommand::Target(target) => handle.set_target(target).await?,
        ConsoleCommand::Delay(delay) => handle.set_delay(delay).await?,
        ConsoleCommand::Reset => handle.reset().await?,
        ConsoleCommand::Status => {
            let snapshot = handle.snapshot();
            let status = format!(
                "{}\n {}",
                render_tub(&snapshot),
                target_text(config, snapshot.target)
            );
            return Ok(Some(status));
        }
        ConsoleCommand::Help => return Ok(Some(HELP_TEXT.to_string())),
        ConsoleCommand::Quit => handle.shutdown().await?,
    }
    Ok(None)
}

/// Read commands from stdin until `quit` or end of input, then shut the
/// widget down.
pub async fn run_console(handle: WidgetHandle, parser: CommandParser) -> Result<()> {
    let printer = tokio::spawn(print_changes(handle.clone()));

    println!("{}", HELP_TEXT);
    println!("{}", render_tub(&handle.snapshot()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match parser.parse(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{} (type `help` for commands)", e);
                continue;
            }
        };
        if command == ConsoleCommand::Quit {
            break;
        }

        match execute(&handle, parser.config(), command).await {
            Ok(Some(text)) => println!("{}", text),
            Ok(None) => {}
            Err(WidgetError::RuntimeClosed) => {
                tracing::warn!("Widget runtime closed while console was running");
                break;
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    if let Err(e) = handle.shutdown().await {
        tracing::debug!("Runtime already stopped: {}", e);
    }
    printer.abort();
    Ok(())
}

// Redraw on every level move and whenever an animation ends
async fn print_changes(handle: WidgetHandle) {
    let mut rx = handle.subscribe();
    loop {
        match rx.recv().await {
            Ok(
                StateChange::LevelChanged { .. }
                | StateChange::AnimationFinished { .. }
                | StateChange::StateReset,
            ) => {
                println!("{}", render_tub(&handle.snapshot()));
            }
            Ok(change) => tracing::trace!("State change: {:?}", change),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!("Console lagged behind by {} changes", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CommandParser {
        CommandParser::new(&WidgetConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_directions() {
        let parser = parser();
        assert_eq!(
            parser.parse("up").unwrap(),
            ConsoleCommand::Direction(Direction::Increasing)
        );
        assert_eq!(
            parser.parse("  DRAIN ").unwrap(),
            ConsoleCommand::Direction(Direction::Decreasing)
        );
        assert_eq!(parser.parse("q").unwrap(), ConsoleCommand::Quit);
        assert_eq!(parser.parse("Reset").unwrap(), ConsoleCommand::Reset);
        assert_eq!(parser.parse("?").unwrap(), ConsoleCommand::Help);
    }

    #[test]
    fn test_parse_target_by_value_and_label() {
        let parser = parser();
        assert_eq!(parser.parse("target 8").unwrap(), ConsoleCommand::Target(8));
        assert_eq!(
            parser.parse("target full up!").unwrap(),
            ConsoleCommand::Target(10)
        );
        assert!(matches!(
            parser.parse("target knee deep"),
            Err(WidgetError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_parse_delay_forms() {
        let parser = parser();
        assert_eq!(
            parser.parse("delay 250ms").unwrap(),
            ConsoleCommand::Delay(Duration::from_millis(250))
        );
        assert_eq!(
            parser.parse("delay 2s").unwrap(),
            ConsoleCommand::Delay(Duration::from_secs(2))
        );
        assert_eq!(
            parser.parse("delay .5").unwrap(),
            ConsoleCommand::Delay(Duration::from_millis(500))
        );
        assert_eq!(
            parser.parse("delay 1/2 second").unwrap(),
            ConsoleCommand::Delay(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let parser = parser();
        assert!(matches!(
            parser.parse("delay 0ms"),
            Err(WidgetError::InvalidDelay(_))
        ));
        assert!(matches!(parser.parse("delay soon"), Err(WidgetError::UnknownPreset(_))));
        assert!(matches!(parser.parse("sideways"), Err(WidgetError::UnknownCommand(_))));
        assert!(matches!(parser.parse("up 3"), Err(WidgetError::UnknownCommand(_))));
        assert!(matches!(parser.parse("target"), Err(WidgetError::UnknownCommand(_))));
    }

    #[test]
    fn test_render_tub() {
        let state = WidgetState {
            level: 2,
            max_capacity: 3,
            target: 2,
            direction: Direction::Increasing,
            ..WidgetState::default()
        };

        let rendered = render_tub(&state);

        let expected = " |          |\n |~~~~~~~~~~| <- target\n |~~~~~~~~~~|\n \\__________/\n Direction: up  Level: 2";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_target_text_uses_preset_label() {
        let config = WidgetConfig::default();
        assert_eq!(target_text(&config, 5), "Target: 5 (Half-way)");
        assert_eq!(target_text(&config, 10), "Target: 10 (Full up!)");
        assert_eq!(target_text(&config, 6), "Target: 6");
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_status_and_reset() {
        let config = WidgetConfig {
            initial_level: 2,
            ..WidgetConfig::default()
        };
        let settings = config.validate().unwrap();
        let (handle, _task) = crate::ui::runtime::WidgetRuntime::spawn(
            &settings,
            &tokio::runtime::Handle::current(),
        );

        execute(&handle, &config, ConsoleCommand::Target(8)).await.unwrap();
        execute(&handle, &config, ConsoleCommand::Direction(Direction::Increasing))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        let status = execute(&handle, &config, ConsoleCommand::Status)
            .await
            .unwrap()
            .unwrap();
        assert!(status.ends_with("Direction: up  Level: 4\n Target: 8 (Over your knees)"));

        assert!(execute(&handle, &config, ConsoleCommand::Reset)
            .await
            .unwrap()
            .is_none());
        tokio::time::sleep(Duration::from_millis(1)).await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.level, 2);
        assert_eq!(snapshot.target, 5);
        assert!(!snapshot.is_animating());
    }

    #[test]
    fn test_render_empty_tub() {
        let rendered = render_tub(&WidgetState::default());
        assert_eq!(rendered.matches('~').count(), 0);
        assert!(rendered.ends_with("Direction: --  Level: 0"));
    }
}
