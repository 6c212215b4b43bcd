//! Configuration Loader Module
//!
//! Loads typed configuration from TOML files with environment-specific
//! overrides and `ADAPTER_`-prefixed environment variables.

use crate::defaults::{DEFAULT_CONFIG_PATH, ENVIRONMENTS_DIR, ENV_PREFIX};
use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Builder for layered configuration loading
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    base: PathBuf,
    environment: Option<String>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a loader reading `base` as the required base file
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            environment: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Overlay `environments/<name>.toml` (next to the base file) when present
    pub fn environment(mut self, name: impl Into<String>) -> Self {
        self.environment = Some(name.into());
        self
    }

    /// Override the environment variable prefix
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Path of the environment overlay file, if an environment is selected
    pub fn overlay_path(&self) -> Option<PathBuf> {
        let env = self.environment.as_ref()?;
        let dir = self.base.parent().unwrap_or(Path::new("."));
        Some(dir.join(ENVIRONMENTS_DIR).join(format!("{}.toml", env)))
    }

    /// Build and deserialize the layered configuration
    pub fn load<T: DeserializeOwned>(&self) -> Result<T> {
        let base = expand_path(&self.base)?;
        debug!("Loading base config: {:?}", base);

        let mut builder = Config::builder().add_source(File::from(base.as_path()).required(true));

        // Add environment-specific overrides if specified
        if let Some(env_file) = self.overlay_path() {
            let env_file = expand_path(&env_file)?;
            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file.as_path()));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (ADAPTER_ prefix, flat keys)
        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

/// Expand `~` and `$VARS` in a configuration path
fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand config path {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Convenience function to load configuration with defaults
pub fn load_config<T: DeserializeOwned>(
    path: Option<&Path>,
    environment: Option<&str>,
) -> Result<T> {
    let mut loader = ConfigLoader::new(path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH)));
    if let Some(env) = environment {
        loader = loader.environment(env);
    }
    loader.load()
}
