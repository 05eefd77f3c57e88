use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::settings::{FileSettingsStore, SettingsStore};
use crate::Config;

/// Application context shared by every command: validated config plus
/// the settings store that lives next to it.
pub struct App {
    config: Config,
    settings: Arc<dyn SettingsStore>,
}

impl App {
    /// Load config from the default location.
    pub fn new() -> Result<Self> {
        let (config, _) = Config::load_validated()?;
        Ok(Self::with_config(config))
    }

    /// Load config from an explicit file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let config = Config::load_from(path)?;
        let validation = config.validate();
        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }
        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: Config) -> Self {
        let settings = FileSettingsStore::new(config.settings_path());
        Self {
            config,
            settings: Arc::new(settings),
        }
    }

    /// Make sure the data directory exists.
    pub fn initialize(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.config_dir).with_context(|| {
            format!(
                "Failed to create data directory {}",
                self.config.config_dir.display()
            )
        })?;
        tracing::debug!(dir = %self.config.config_dir.display(), "Application initialized");
        Ok(())
    }

    pub fn shutdown(&self) {
        tracing::debug!("Shutting down");
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> Arc<dyn SettingsStore> {
        self.settings.clone()
    }
}
