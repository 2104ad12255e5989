use crate::models::WidgetConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;

/// File name of the widget configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "Bathtub.yaml";

/// Prefix of environment variables that override file values
/// (`BATHTUB_TARGET`, `BATHTUB_DELAY_MS`, ...).
pub const ENV_PREFIX: &str = "BATHTUB";

/// Scalar settings that may be overridden from the environment.
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    max_capacity: Option<u32>,
    target: Option<u32>,
    delay_ms: Option<u64>,
    initial_level: Option<u32>,
    debug_mode: Option<bool>,
}

impl EnvOverrides {
    fn apply(self, config: &mut WidgetConfig) {
        if let Some(max_capacity) = self.max_capacity {
            config.max_capacity = max_capacity;
        }
        if let Some(target) = self.target {
            config.target = target;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        if let Some(initial_level) = self.initial_level {
            config.initial_level = initial_level;
        }
        if let Some(debug_mode) = self.debug_mode {
            config.debug_mode = debug_mode;
        }
    }
}

/// Where [`ConfigManager::load_config`] takes its base values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Defaults,
}

/// Configuration manager for loading and saving `Bathtub.yaml`.
///
/// The YAML file supplies the full [`WidgetConfig`] (presets included); scalar
/// settings can then be overridden with `BATHTUB_*` environment variables.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager for `config_dir`, creating the directory if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the configuration with overrides from the process environment.
    pub fn load_config(&self) -> Result<WidgetConfig> {
        self.load_config_with_env(None)
    }

    /// Load the configuration, taking overrides from `env` instead of the
    /// process environment when given.
    ///
    /// # Returns
    /// The file contents (or defaults if the file doesn't exist) with
    /// overrides applied. Values are not validated here; see
    /// [`WidgetConfig::validate`].
    pub fn load_config_with_env(
        &self,
        env: Option<::config::Map<String, String>>,
    ) -> Result<WidgetConfig> {
        let mut widget_config = self.load_file()?;

        let overrides: EnvOverrides = ::config::Config::builder()
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .context("Failed to read environment overrides")?
            .try_deserialize()
            .context("Failed to parse environment overrides")?;
        overrides.apply(&mut widget_config);

        Ok(widget_config)
    }

    // Silent: the config is read before logging is installed
    fn load_file(&self) -> Result<WidgetConfig> {
        if self.source() == ConfigSource::Defaults {
            return Ok(WidgetConfig::default());
        }

        let file_contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse config: {}", self.config_path))
    }

    pub fn source(&self) -> ConfigSource {
        if self.config_path.exists() {
            ConfigSource::File
        } else {
            ConfigSource::Defaults
        }
    }

    /// Report where the configuration came from. Call once a subscriber is
    /// installed.
    pub fn log_source(&self) {
        match self.source() {
            ConfigSource::File => tracing::info!("Loaded config from {}", self.config_path),
            ConfigSource::Defaults => tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            ),
        }
    }

    /// Save the configuration file.
    pub fn save_config(&self, widget_config: &WidgetConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(widget_config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
