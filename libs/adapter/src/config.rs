//! # Adapter Configuration - Deployment Wiring
//!
//! ## Purpose
//!
//! Holds the addresses that tie an adapter instance to its deployment: the
//! adapter's own ledger account (where pulled funds sit mid-operation) and
//! the factory/router pair it is expected to drive, plus routing limits.
//!
//! ## Integration Points
//!
//! - **Input Sources**: TOML files and `ADAPTER_*` environment variables via
//!   `adapter-config` (`ADAPTER_ACCOUNT`, `ADAPTER_FACTORY`, `ADAPTER_ROUTER`,
//!   `ADAPTER_MAX_HOPS`)
//! - **Output Destinations**: [`Adapter::new`](crate::Adapter::new), which
//!   cross-checks the engine's addresses against this config
//! - **Validation**: zero addresses and a zero hop limit are rejected

use crate::errors::AdapterError;
use crate::types::Address;
use adapter_config::defaults::routing::DEFAULT_MAX_HOPS;
use adapter_config::ConfigLoader;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Ledger account the adapter holds custody under
    pub account: Address,
    /// Expected pool factory address
    pub factory: Address,
    /// Expected router address (spender for adapter approvals)
    pub router: Address,
    /// Maximum hops accepted by `swap_by_path`
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
}

fn default_max_hops() -> usize {
    DEFAULT_MAX_HOPS
}

impl AdapterConfig {
    pub fn new(account: Address, factory: Address, router: Address) -> Self {
        Self {
            account,
            factory,
            router,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Load from a base file, optional environment overlay and `ADAPTER_*`
    /// variables, then validate
    pub fn load(path: &Path, environment: Option<&str>) -> Result<Self> {
        let mut loader = ConfigLoader::new(path);
        if let Some(env) = environment {
            loader = loader.environment(env);
        }
        let config: AdapterConfig = loader.load()?;
        config
            .validate()
            .with_context(|| format!("Invalid adapter configuration in {:?}", path))?;
        info!(
            "Loaded adapter config: account={} factory={} router={} max_hops={}",
            config.account, config.factory, config.router, config.max_hops
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AdapterError> {
        for (name, address) in [
            ("account", self.account),
            ("factory", self.factory),
            ("router", self.router),
        ] {
            if address.is_zero() {
                return Err(AdapterError::InvalidConfig {
                    reason: format!("{} address must not be zero", name),
                });
            }
        }
        if self.max_hops == 0 {
            return Err(AdapterError::InvalidConfig {
                reason: "max_hops must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
