//! Bathtub - console driver for the animated water level widget
//!
//! # Overview
//!
//! This binary runs the widget without a graphical view. It initializes:
//! - Configuration loading ([`ConfigManager`], `Bathtub Data/Bathtub.yaml`
//!   plus `BATHTUB_*` environment overrides)
//! - Logging infrastructure (daily rotating file under `logs/`)
//! - Tokio runtime hosting the [`WidgetRuntime`] task and its step timers
//! - The console loop, which reads commands from stdin and redraws the tub
//!   on every state change
//!
//! # Execution Flow
//!
//! 1. Load `Bathtub.yaml` (defaults if missing)
//! 2. Initialize logging -> logs/bathtub.<date>, mirrored to stderr in debug mode
//! 3. Report the config source, validate it, then create the tokio runtime
//!    and spawn the widget runtime
//! 4. Run the console until `quit` or end of input
//! 5. Shutdown tokio runtime with a 1s timeout

use anyhow::{Context, Result};
use bathtub::logging::{LoggingOptions, setup_logging};
use bathtub::ui::{CommandParser, run_console};
use bathtub::{APP_NAME, ConfigManager, VERSION, WidgetRuntime};
use std::time::Duration;

fn main() -> Result<()> {
    let config_manager = ConfigManager::new("Bathtub Data")?;
    let widget_config = config_manager.load_config()?;

    let _guard = setup_logging(
        &LoggingOptions::new("logs", "bathtub").verbose(widget_config.debug_mode),
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    config_manager.log_source();

    let settings = widget_config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", config_manager.config_path()))?;
    let parser = CommandParser::new(&widget_config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("bathtub-worker")
        .build()
        .context("Failed to build tokio runtime")?;

    let result = runtime.block_on(async {
        let (handle, task) = WidgetRuntime::spawn(&settings, &tokio::runtime::Handle::current());

        let console_result = run_console(handle, parser).await;

        if let Err(e) = task.await {
            tracing::error!("Widget runtime task failed: {}", e);
        }
        console_result
    });

    // stdin reads run on a blocking thread that may still be parked
    runtime.shutdown_timeout(Duration::from_secs(1));

    tracing::info!("Application shutdown complete");

    result.inspect_err(|e| tracing::error!("Console error: {:#}", e))
}
