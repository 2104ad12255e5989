use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Where and how much to log.
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Directory for log files (e.g., "logs")
    pub log_dir: Utf8PathBuf,
    /// Prefix for log files (e.g., "bathtub")
    pub log_prefix: String,
    /// Debug level instead of info when `RUST_LOG` is not set
    pub debug_mode: bool,
    /// Also log to the terminal
    pub console_output: bool,
}

impl LoggingOptions {
    pub fn new(log_dir: impl Into<Utf8PathBuf>, log_prefix: impl Into<String>) -> Self {
        Self {
            log_dir: log_dir.into(),
            log_prefix: log_prefix.into(),
            debug_mode: false,
            console_output: false,
        }
    }

    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    pub fn console_output(mut self, enabled: bool) -> Self {
        self.console_output = enabled;
        self
    }

    /// Debug level and a stderr mirror of the log file together.
    pub fn verbose(self, enabled: bool) -> Self {
        self.debug_mode(enabled).console_output(enabled)
    }
}

/// Create the log directory if it doesn't exist.
pub fn ensure_log_dir(log_dir: &Utf8Path) -> Result<()> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }
    Ok(())
}

/// Filter honoring `RUST_LOG`, falling back to debug or info.
pub fn env_filter(debug_mode: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug_mode {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    })
}

/// Setup logging with a daily rotating file appender and optional console output.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(options: &LoggingOptions) -> Result<WorkerGuard> {
    ensure_log_dir(&options.log_dir)?;

    let file_appender = rolling::daily(&options.log_dir, &options.log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // Console output goes to stderr so it never interleaves with the tub on stdout
    let console_layer = options.console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter(options.debug_mode))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}",
        options.log_dir,
        options.log_prefix,
        options.debug_mode,
        options.console_output
    );

    Ok(guard)
}
